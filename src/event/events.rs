/// Which stack a restore was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreDirection {
    Undo,
    Redo,
}

impl std::fmt::Display for RestoreDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undo => write!(f, "undo"),
            Self::Redo => write!(f, "redo"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEvent {
    /// Emitted after every stack mutation
    Changed {
        can_undo: bool,
        can_redo: bool,
        undo_depth: usize,
        redo_depth: usize,
    },
    /// A restore finished and the surface now shows the restored snapshot
    Restored {
        direction: RestoreDirection,
    },
    /// A restore could not decode its snapshot; the surface was left as it was
    RestoreFailed {
        direction: RestoreDirection,
        rolled_back: bool,
        reason: String,
    },
}
