//! Bounded response rendering
//!
//! Tool output must fit a fixed character budget. [`truncate`] keeps the
//! longest prefix of a result set whose rendering fits, and the renderer is
//! told about the cut so the notice it prints is part of the measured text.

/// An ordered record set plus the total the source declared for it
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableResult<T> {
    /// Records in display order
    pub items: Vec<T>,

    /// Total reported by the source; never below `items.len()`
    pub declared_total: usize,
}

impl<T> RenderableResult<T> {
    /// Create a result, raising `declared_total` to at least the item count
    pub fn new(items: Vec<T>, declared_total: usize) -> Self {
        let declared_total = declared_total.max(items.len());
        Self {
            items,
            declared_total,
        }
    }

    /// Create a result whose total is exactly its item count
    pub fn complete(items: Vec<T>) -> Self {
        let declared_total = items.len();
        Self {
            items,
            declared_total,
        }
    }
}

/// Record of a truncation: how many items there were and how many survived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationNotice {
    pub original_count: usize,
    pub kept_count: usize,
}

impl TruncationNotice {
    /// Human readable explanation shown to the caller
    pub fn message(&self) -> String {
        format!(
            "Response truncated from {} to {} items. Use pagination parameters or add more specific filters to see additional results.",
            self.original_count, self.kept_count
        )
    }
}

/// What a renderer sees: a prefix of the items plus truncation metadata
#[derive(Debug, Clone, Copy)]
pub struct ResultView<'a, T> {
    pub items: &'a [T],
    pub declared_total: usize,
    pub truncation: Option<TruncationNotice>,
}

/// Outcome of [`truncate`]
#[derive(Debug, Clone, PartialEq)]
pub struct TruncatedResult<T> {
    /// The surviving records
    pub result: RenderableResult<T>,

    /// Present when items were dropped or a lone item overflows the budget
    pub notice: Option<TruncationNotice>,
}

impl<T> TruncatedResult<T> {
    /// Whether the output was cut to fit the budget
    pub fn is_truncated(&self) -> bool {
        self.notice.is_some()
    }

    /// Number of items before truncation
    pub fn original_count(&self) -> usize {
        self.notice
            .map(|n| n.original_count)
            .unwrap_or(self.result.items.len())
    }

    /// Number of items kept
    pub fn kept_count(&self) -> usize {
        self.result.items.len()
    }

    /// View over the kept items, as the renderer saw it during the search
    pub fn view(&self) -> ResultView<'_, T> {
        ResultView {
            items: &self.result.items,
            declared_total: self.result.declared_total,
            truncation: self.notice,
        }
    }

    /// Render the kept items
    pub fn render<F>(&self, render: F) -> String
    where
        F: Fn(&ResultView<'_, T>) -> String,
    {
        render(&self.view())
    }
}

/// Cut `result` to the longest prefix whose rendering fits `budget` characters.
///
/// Returns the input untouched when its full rendering already fits. Otherwise
/// binary-searches the prefix length over `1..=len`, rendering each candidate
/// with the truncation notice it would carry. At least one item is always
/// kept, even when that single item overflows the budget.
pub fn truncate<T, F>(result: RenderableResult<T>, render: F, budget: usize) -> TruncatedResult<T>
where
    F: Fn(&ResultView<'_, T>) -> String,
{
    let full = ResultView {
        items: &result.items,
        declared_total: result.declared_total,
        truncation: None,
    };

    let original_count = result.items.len();
    if original_count == 0 || rendered_len(&render(&full)) <= budget {
        return TruncatedResult {
            result,
            notice: None,
        };
    }

    let fits = |kept: usize| {
        let view = ResultView {
            items: &result.items[..kept],
            declared_total: result.declared_total,
            truncation: Some(TruncationNotice {
                original_count,
                kept_count: kept,
            }),
        };
        rendered_len(&render(&view)) <= budget
    };

    let mut low = 1;
    let mut high = original_count;
    let mut best_count = 1;

    while low <= high {
        let mid = low + (high - low) / 2;
        if fits(mid) {
            best_count = mid;
            low = mid + 1;
        } else {
            if mid == 1 {
                tracing::debug!(budget, "single item exceeds response budget");
            }
            high = mid - 1;
        }
    }

    let RenderableResult {
        mut items,
        declared_total,
    } = result;
    items.truncate(best_count);

    TruncatedResult {
        result: RenderableResult {
            items,
            declared_total,
        },
        notice: Some(TruncationNotice {
            original_count,
            kept_count: best_count,
        }),
    }
}

/// Truncate `result` to `budget` and render what survives with the same renderer
pub fn render_within<T, F>(result: RenderableResult<T>, render: F, budget: usize) -> String
where
    F: Fn(&ResultView<'_, T>) -> String,
{
    let truncated = truncate(result, &render, budget);
    if let Some(notice) = truncated.notice {
        tracing::info!(
            original = notice.original_count,
            kept = notice.kept_count,
            budget,
            "response truncated"
        );
    }
    truncated.render(&render)
}

/// Budget is measured in characters, not bytes
fn rendered_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Each item renders as its own text on a line; a notice adds a fixed header.
    fn render_lines(view: &ResultView<'_, String>) -> String {
        let mut out = String::new();
        if let Some(notice) = view.truncation {
            out.push_str(&format!("[{}/{}]\n", notice.kept_count, notice.original_count));
        }
        for item in view.items {
            out.push_str(item);
            out.push('\n');
        }
        out
    }

    fn items(lengths: &[usize]) -> Vec<String> {
        lengths.iter().map(|n| "x".repeat(*n)).collect()
    }

    fn render_prefix(all: &[String], kept: usize) -> String {
        render_lines(&ResultView {
            items: &all[..kept],
            declared_total: all.len(),
            truncation: Some(TruncationNotice {
                original_count: all.len(),
                kept_count: kept,
            }),
        })
    }

    #[test]
    fn test_fits_returns_unchanged() {
        let input = RenderableResult::complete(items(&[3, 3, 3]));
        let out = truncate(input.clone(), render_lines, 100);
        assert!(!out.is_truncated());
        assert_eq!(out.result, input);
        assert_eq!(out.original_count(), 3);
    }

    #[test]
    fn test_empty_result_is_never_truncated() {
        let input: RenderableResult<String> = RenderableResult::complete(vec![]);
        let out = truncate(input, |_| "a very long empty-state message".to_string(), 5);
        assert!(!out.is_truncated());
        assert_eq!(out.kept_count(), 0);
    }

    #[test]
    fn test_single_oversized_item_is_kept() {
        let input = RenderableResult::complete(items(&[500, 10, 10]));
        let out = truncate(input, render_lines, 50);
        assert!(out.is_truncated());
        assert_eq!(out.kept_count(), 1);
        assert_eq!(out.original_count(), 3);
        assert_eq!(out.result.items[0].len(), 500);
    }

    #[test]
    fn test_oversized_item_is_not_rendered_twice() {
        let renders = std::cell::Cell::new(0);
        let counting = |view: &ResultView<'_, String>| {
            renders.set(renders.get() + 1);
            render_lines(view)
        };

        let out = truncate(RenderableResult::complete(items(&[500])), counting, 50);
        assert!(out.is_truncated());
        assert_eq!(out.kept_count(), 1);
        // Full rendering plus the single search step
        assert_eq!(renders.get(), 2);
    }

    #[test]
    fn test_kept_prefix_is_maximal_exhaustive() {
        let datasets: Vec<Vec<usize>> = vec![
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
            vec![10, 1, 1, 1, 1, 1, 1],
            vec![4; 17],
            vec![7, 3, 12, 1, 9, 2, 2, 30, 5],
        ];

        for lengths in datasets {
            let all = items(&lengths);
            let full_len = render_lines(&ResultView {
                items: &all,
                declared_total: all.len(),
                truncation: None,
            })
            .len();

            for budget in 0..=full_len + 2 {
                let out = truncate(RenderableResult::complete(all.clone()), render_lines, budget);

                if full_len <= budget {
                    assert!(!out.is_truncated(), "budget {} should fit", budget);
                    assert_eq!(out.kept_count(), all.len());
                    continue;
                }

                let kept = out.kept_count();
                assert!(out.is_truncated());
                assert!(kept >= 1);
                assert!(kept < all.len() || all.len() == 1);

                let rendered = out.render(render_lines);
                if render_prefix(&all, 1).len() <= budget {
                    assert!(rendered.len() <= budget, "budget {} overflowed", budget);
                }

                // No longer prefix also fits.
                for longer in kept + 1..all.len() {
                    assert!(
                        render_prefix(&all, longer).len() > budget,
                        "prefix {} fits budget {} but only {} kept",
                        longer,
                        budget,
                        kept
                    );
                }
            }
        }
    }

    #[test]
    fn test_notice_message() {
        let notice = TruncationNotice {
            original_count: 120,
            kept_count: 37,
        };
        assert!(notice.message().starts_with("Response truncated from 120 to 37 items."));
    }

    #[test]
    fn test_budget_counts_characters() {
        let input = RenderableResult::complete(vec!["€€€€".to_string(), "€€€€".to_string()]);
        // 10 characters in total, 26 bytes.
        let out = truncate(input, render_lines, 10);
        assert!(!out.is_truncated());
    }

    #[test]
    fn test_render_within_includes_notice() {
        let input = RenderableResult::complete(items(&[8, 8, 8, 8]));
        let text = render_within(input, render_lines, 24);
        assert!(text.starts_with("[2/4]\n"));
        assert!(text.chars().count() <= 24);
    }

    #[test]
    fn test_declared_total_preserved() {
        let input = RenderableResult::new(items(&[20, 20, 20]), 500);
        let out = truncate(input, render_lines, 30);
        assert_eq!(out.result.declared_total, 500);
        assert_eq!(out.view().declared_total, 500);
    }
}
