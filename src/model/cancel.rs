use rocket::{
    request::{FromRequest, Outcome},
    tokio::sync::watch,
    Request, State,
};

use crate::error::{Error, Result};

/// The sending half of a cancellation signal.
pub struct Canceller(watch::Sender<bool>);

impl Canceller {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self(sender)
    }

    /// A signal that fires once [`Canceller::cancel`] is called.
    pub fn signal(&self) -> Cancellation {
        Cancellation(self.0.subscribe())
    }

    /// Ask every operation holding a signal to stop issuing store calls.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl Default for Canceller {
    fn default() -> Self {
        Self::new()
    }
}

/// A cancellation signal handed to every service operation.
///
/// Operations check it before each store call. A cancelled operation simply
/// stops making progress: whatever was already written stays written.
#[derive(Clone)]
pub struct Cancellation(watch::Receiver<bool>);

impl Cancellation {
    /// A signal that never fires.
    pub fn never() -> Self {
        Canceller::new().signal()
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Fail with [`Error::Cancelled`] if the signal has fired.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Requests are cancelled when the server shuts down.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for Cancellation {
    type Error = ();

    /// Panics iff the [`Canceller`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let canceller = req.guard::<&State<Canceller>>().await.unwrap();
        Outcome::Success(canceller.signal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_fires_after_cancel() {
        let canceller = Canceller::new();
        let before = canceller.signal();
        assert!(before.check().is_ok());

        canceller.cancel();
        assert!(before.is_cancelled());
        assert!(matches!(canceller.signal().check(), Err(Error::Cancelled)));
    }

    #[test]
    fn never_outlives_its_sender() {
        let never = Cancellation::never();
        assert!(!never.is_cancelled());
    }
}
