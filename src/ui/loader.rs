//! Background record loads. Each request runs on its own worker thread and
//! reports back through a channel that the event loop drains on every tick,
//! so a slow or unreachable API never blocks drawing.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use crate::error::AdminError;
use crate::models::{EntityKind, KindConfig, Record};
use crate::source::RecordSource;

pub(crate) struct LoadOutcome {
    pub(crate) kind: EntityKind,
    pub(crate) ticket: u64,
    pub(crate) result: Result<Vec<Record>, AdminError>,
}

pub(crate) struct Loader {
    source: Arc<dyn RecordSource>,
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
}

impl Loader {
    pub(crate) fn new(source: Arc<dyn RecordSource>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { source, tx, rx }
    }

    /// Start fetching `config`'s resource in the background.
    pub(crate) fn request(&self, config: KindConfig, ticket: u64) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = source.fetch(&config);
            // The receiver lives as long as the app; a failed send only
            // happens during shutdown.
            let _ = tx.send(LoadOutcome {
                kind: config.kind,
                ticket,
                result,
            });
        });
    }

    /// Collect every result that has arrived since the last call.
    pub(crate) fn drain(&self) -> Vec<LoadOutcome> {
        self.rx.try_iter().collect()
    }

    /// Block until the next result arrives. Test helper.
    #[cfg(test)]
    pub(crate) fn recv(&self) -> Option<LoadOutcome> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;

    struct FixedSource;

    impl RecordSource for FixedSource {
        fn fetch(&self, config: &KindConfig) -> Result<Vec<Record>, AdminError> {
            Ok(vec![Record {
                id: RecordId::new(1),
                first_name: "Ann".into(),
                last_name: "Lee".into(),
                category: config.categories[0].clone(),
            }])
        }
    }

    #[test]
    fn results_carry_kind_and_ticket() {
        let loader = Loader::new(Arc::new(FixedSource));
        loader.request(EntityKind::Teacher.default_config(), 42);

        let outcome = loader.recv().unwrap();
        assert_eq!(outcome.kind, EntityKind::Teacher);
        assert_eq!(outcome.ticket, 42);
        assert_eq!(outcome.result.unwrap()[0].category, "Junior");
        assert!(loader.drain().is_empty());
    }
}
