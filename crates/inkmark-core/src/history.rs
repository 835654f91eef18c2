//! Linear undo/redo history.

/// Append-only log of immutable snapshots plus a cursor.
///
/// `snapshots[cursor]` is the current state. Undo/redo only move the cursor;
/// committing after an undo first truncates everything past the cursor.
/// Unbounded unless built with [`History::with_capacity`].
#[derive(Debug, Clone, PartialEq)]
pub struct History<T> {
    snapshots: Vec<T>,
    cursor: usize,
    capacity: Option<usize>,
}

impl<T: Clone> History<T> {
    /// A history seeded with a single snapshot.
    pub fn new(initial: T) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
            capacity: None,
        }
    }

    /// A history keeping at most `capacity` snapshots; the oldest go first.
    pub fn with_capacity(initial: T, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new(initial)
        }
    }

    /// The snapshot under the cursor.
    pub fn current(&self) -> &T {
        &self.snapshots[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of snapshots held.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Discard every snapshot after the cursor.
    pub fn truncate_after_cursor(&mut self) {
        self.snapshots.truncate(self.cursor + 1);
    }

    /// Record a new state and make it current.
    pub fn commit(&mut self, snapshot: T) {
        self.truncate_after_cursor();
        self.snapshots.push(snapshot);
        if let Some(capacity) = self.capacity {
            if self.snapshots.len() > capacity {
                self.snapshots.remove(0);
            }
        }
        self.cursor = self.snapshots.len() - 1;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Step back; `None` at the oldest snapshot.
    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    /// Step forward; `None` at the newest snapshot.
    pub fn redo(&mut self) -> Option<&T> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }
}
