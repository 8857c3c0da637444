/// Position within an ordered question sequence.
///
/// The index always stays in `[0, len - 1]` (or at 0 for an empty sequence).
/// Moves past either end are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationCursor {
    index: usize,
    len: usize,
}

impl NavigationCursor {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `advance` would be a no-op.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.len
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    /// Returns whether the cursor moved.
    pub fn advance(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Returns whether the cursor moved.
    pub fn retreat(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Move to `index`, clamped to the last question.
    pub fn jump_to(&mut self, index: usize) {
        self.index = index.min(self.len.saturating_sub(1));
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retreat_at_start_is_noop() {
        let mut cursor = NavigationCursor::new(3);
        assert!(!cursor.retreat());
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn advance_stops_at_last() {
        let mut cursor = NavigationCursor::new(2);
        assert!(cursor.advance());
        assert!(cursor.is_last());
        assert!(!cursor.advance());
        assert_eq!(cursor.index(), 1);
    }

    #[test]
    fn walk_never_leaves_bounds() {
        let mut cursor = NavigationCursor::new(4);
        let moves = [true, true, true, true, true, false, false, true, false, false, false, false];
        for forward in moves {
            if forward {
                cursor.advance();
            } else {
                cursor.retreat();
            }
            assert!(cursor.index() < cursor.len());
        }
    }

    #[test]
    fn jump_clamps() {
        let mut cursor = NavigationCursor::new(3);
        cursor.jump_to(10);
        assert_eq!(cursor.index(), 2);
        cursor.reset();
        assert!(cursor.is_first());
    }

    #[test]
    fn single_question_is_first_and_last() {
        let mut cursor = NavigationCursor::new(1);
        assert!(cursor.is_first());
        assert!(cursor.is_last());
        assert!(!cursor.advance());
    }

    #[test]
    fn empty_sequence_stays_at_zero() {
        let mut cursor = NavigationCursor::new(0);
        assert!(cursor.is_empty());
        assert!(!cursor.advance());
        cursor.jump_to(3);
        assert_eq!(cursor.index(), 0);
    }
}
