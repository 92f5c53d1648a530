use std::{cell::Cell, rc::Rc, time::Duration};

use cavia::{dependencies, Error, ErrorKind, Injector, Instance, Provider};

fn counting_provider(calls: &Rc<Cell<usize>>) -> Provider {
    let calls = Rc::clone(calls);

    Provider::factory_async("SLOW", dependencies![], move |_| {
        let calls = Rc::clone(&calls);

        async move {
            tokio::task::yield_now().await;
            calls.set(calls.get() + 1);
            Ok::<_, Error>(calls.get())
        }
    })
}

#[tokio::test]
async fn eager_creation_resolves_everything() {
    let calls = Rc::new(Cell::new(0));

    let injector = Injector::create(vec![counting_provider(&calls)])
        .await
        .unwrap();

    assert!(injector.eager());
    assert!(injector.is_resolved("SLOW"));
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn lazy_creation_resolves_on_first_lookup() {
    let calls = Rc::new(Cell::new(0));

    let injector = Injector::options()
        .eager(false)
        .provider(counting_provider(&calls))
        .create()
        .await
        .unwrap();

    assert!(!injector.eager());
    assert!(!injector.is_resolved("SLOW"));
    assert_eq!(calls.get(), 0);

    injector.find("SLOW").await.unwrap();
    injector.find("SLOW").await.unwrap();

    assert!(injector.is_resolved("SLOW"));
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn lazy_creation_defers_errors() {
    let injector = Injector::options()
        .eager(false)
        .provider(Provider::existing("A", "A"))
        .create()
        .await;

    let injector = injector.unwrap();
    assert!(injector.find("A").await.is_err());
}

#[tokio::test]
async fn overlapping_requests_share_one_instantiation() {
    let calls = Rc::new(Cell::new(0));

    let injector = Injector::options()
        .eager(false)
        .provider(counting_provider(&calls))
        .create()
        .await
        .unwrap();

    let (a, b) = tokio::join!(injector.find("SLOW"), injector.find("SLOW"));
    let (a, b) = (a.unwrap().unwrap(), b.unwrap().unwrap());

    assert!(Instance::ptr_eq(&a, &b));
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn overlapping_requests_through_dependents() {
    let calls = Rc::new(Cell::new(0));

    let injector = Injector::options()
        .eager(false)
        .providers(vec![
            counting_provider(&calls),
            Provider::factory("LEFT", dependencies!["SLOW"], |args| {
                Ok::<_, Error>(args.required::<usize>(0)?)
            }),
            Provider::factory("RIGHT", dependencies!["SLOW"], |args| {
                Ok::<_, Error>(args.required::<usize>(0)?)
            }),
        ])
        .create()
        .await
        .unwrap();

    let (left, right) = tokio::join!(
        injector.find_as::<Rc<usize>>("LEFT"),
        injector.find_as::<Rc<usize>>("RIGHT"),
    );

    let (left, right) = (left.unwrap().unwrap(), right.unwrap().unwrap());
    assert!(Rc::ptr_eq(&*left, &*right));
    assert_eq!(calls.get(), 1);
}

fn yielding_provider(token: &'static str) -> Provider {
    Provider::factory_async(token, dependencies![], |_| async {
        tokio::task::yield_now().await;
        Ok::<_, Error>(())
    })
}

#[tokio::test]
async fn overlapping_requests_entering_a_cycle_fail() {
    let injector = Injector::options()
        .eager(false)
        .providers(vec![
            yielding_provider("SLOW_A"),
            yielding_provider("SLOW_B"),
            Provider::factory("A", dependencies!["SLOW_A", "B"], |_| Ok::<_, Error>(())),
            Provider::factory("B", dependencies!["SLOW_B", "A"], |_| Ok::<_, Error>(())),
        ])
        .create()
        .await
        .unwrap();

    let (a, b) = tokio::time::timeout(
        Duration::from_secs(2),
        async { tokio::join!(injector.find("A"), injector.find("B")) },
    )
    .await
    .expect("overlapping requests on a cycle must not wait forever");

    assert_eq!(a.unwrap_err().kind(), ErrorKind::CircularDependency);
    assert_eq!(b.unwrap_err().kind(), ErrorKind::CircularDependency);

    assert!(injector.is_resolved("SLOW_A"));
    assert!(injector.is_resolved("SLOW_B"));
    assert!(!injector.is_resolved("A"));
    assert!(!injector.is_resolved("B"));

    let error = injector.find("A").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::CircularDependency);
}
