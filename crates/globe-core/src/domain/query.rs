/// Pagination window for list operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub skip: Option<u64>,
    pub top: Option<u64>,
}

impl Page {
    /// `top=0` means no limit, like an absent `top`.
    pub fn new(skip: Option<u64>, top: Option<u64>) -> Self {
        Self {
            skip,
            top: top.filter(|&top| top > 0),
        }
    }

    /// Apply the window to an in-order sequence.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let skipped = items.into_iter().skip(self.skip.unwrap_or(0) as usize);
        match self.top {
            Some(top) => skipped.take(top as usize).collect(),
            None => skipped.collect(),
        }
    }
}

/// Exact-match filters for posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub published: Option<bool>,
    pub category_id: Option<String>,
}

/// Exact-match filters for a post's comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentFilter {
    pub approved: Option<bool>,
}
