/// Strings pushed by the frame callback for the overlay.
///
/// Filled during a frame's callback and drained by that frame's `present`,
/// so the queue is empty whenever a callback starts.
#[derive(Debug, Default, Clone)]
pub struct DebugTextQueue {
    lines: Vec<String>,
}

impl DebugTextQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    /// Takes all queued lines in push order, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_order_and_empties() {
        let mut q = DebugTextQueue::new();
        q.push("a");
        q.push(String::from("b"));
        assert_eq!(q.len(), 2);
        assert_eq!(q.drain(), vec!["a".to_string(), "b".to_string()]);
        assert!(q.is_empty());
        assert!(q.drain().is_empty());
    }
}
