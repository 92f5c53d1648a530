use std::rc::Rc;

use cavia::{dependencies, Error, ErrorKind, Injectable, Injector, Provider, Token};

#[tokio::test]
async fn factories_depending_on_each_other() {
    let error = Injector::create(vec![
        Provider::factory("A", dependencies!["B"], |_| Ok::<_, Error>(())),
        Provider::factory("B", dependencies!["A"], |_| Ok::<_, Error>(())),
    ])
    .await
    .err()
    .unwrap();

    assert_eq!(error.kind(), ErrorKind::CircularDependency);
    match error {
        Error::CircularDependency { token, chain } => {
            assert_eq!(token, Token::from("A"));
            assert!(chain.contains(" --> A"));
            assert!(chain.contains("B"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn aliases_through_a_loop() {
    let error = Injector::create(vec![
        Provider::existing("A", "B"),
        Provider::existing("B", "C"),
        Provider::existing("C", "A"),
    ])
    .await
    .err()
    .unwrap();

    assert_eq!(error.kind(), ErrorKind::CircularDependency);
}

#[tokio::test]
async fn injectable_types_depending_on_each_other() {
    #[Injectable]
    struct A(Rc<B>);

    #[Injectable]
    struct B(Rc<A>);

    let error = Injector::options()
        .eager(false)
        .providers(vec![Provider::ty::<A>(), Provider::ty::<B>()])
        .create()
        .await
        .unwrap()
        .resolve::<B>()
        .await
        .err()
        .unwrap();

    assert!(matches!(error, Error::CircularDependency { token, .. } if token == Token::of::<B>()));
}

#[tokio::test]
async fn shared_dependencies_are_not_cycles() {
    let injector = Injector::create(vec![
        Provider::value("SHARED", 1_u8),
        Provider::factory("LEFT", dependencies!["SHARED"], |_| Ok::<_, Error>(())),
        Provider::factory("RIGHT", dependencies!["SHARED"], |_| Ok::<_, Error>(())),
        Provider::factory("TOP", dependencies!["LEFT", "RIGHT", "SHARED"], |_| {
            Ok::<_, Error>(())
        }),
    ])
    .await;

    assert!(injector.is_ok());
}
