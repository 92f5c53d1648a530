#![cfg(feature = "tracing")]

use std::{
    io,
    sync::{Arc, Mutex},
};

use cavia::{Injector, Provider};
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn registration_and_resolution_are_logged() {
    let captured = Captured::default();

    let _guard = tracing_subscriber::registry()
        .with(EnvFilter::new("cavia=debug"))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(captured.clone()),
        )
        .set_default();

    let injector = Injector::create(vec![
        Provider::value("A", 1),
        Provider::value("A", 2),
        Provider::existing("B", "A"),
    ])
    .await
    .unwrap();

    assert_eq!(injector.resolved_len(), 3);

    let logs = captured.contents();
    assert!(logs.contains("(+) insert new"), "{logs}");
    assert!(logs.contains("(!) shadowed by an earlier `provide`"), "{logs}");
    assert!(logs.contains("(=) resolved `B`"), "{logs}");
    assert_eq!(logs.matches("(!) shadowed").count(), 1, "{logs}");
}
