use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Pauses one call inside a repository so a test can run another
/// operation in the gap.
#[derive(Debug, Default)]
pub struct Gate {
    armed: AtomicBool,
    arrived: Notify,
    release: Notify,
}

impl Gate {
    /// The next `pass` blocks until `open` is called.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub async fn pass(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.arrived.notify_one();
            self.release.notified().await;
        }
    }

    pub async fn wait_until_held(&self) {
        self.arrived.notified().await;
    }

    pub fn open(&self) {
        self.release.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gate_holds_one_call() {
        let gate = Gate::default();
        // Unarmed gates let calls straight through
        gate.pass().await;

        gate.arm();
        let (_, order) = tokio::join!(gate.pass(), async {
            gate.wait_until_held().await;
            gate.open();
            "released"
        });
        assert_eq!(order, "released");
        gate.pass().await;
    }
}
