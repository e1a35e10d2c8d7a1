//! Back-navigation handling for open modals.

/// Close action run when the user navigates back.
pub type CloseHandler = Box<dyn FnOnce() + Send>;

/// Identifies one registration; stale tokens cannot unregister a newer modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModalToken(u64);

/// Single-slot registry: only the most recently opened modal is closable.
#[derive(Default)]
pub struct ModalRegistry {
    current: Option<(ModalToken, CloseHandler)>,
    next_id: u64,
}

impl ModalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler`, replacing any previous one.
    pub fn register(&mut self, handler: CloseHandler) -> ModalToken {
        self.next_id += 1;
        let token = ModalToken(self.next_id);
        self.current = Some((token, handler));
        token
    }

    /// Remove the handler if `token` is still the current one.
    pub fn unregister(&mut self, token: ModalToken) -> bool {
        match &self.current {
            Some((current, _)) if *current == token => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    /// Run and clear the current handler. `false` means nothing was open and
    /// the host should perform its default back action.
    pub fn handle_back(&mut self) -> bool {
        match self.current.take() {
            Some((_, handler)) => {
                handler();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }
}
