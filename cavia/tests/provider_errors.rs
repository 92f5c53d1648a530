use std::{cell::Cell, rc::Rc};

use cavia::{
    BoxError, Declaration, Dependency, Error, ErrorKind, Injectable, InjectableMetadata, Injector,
    Provider, Token,
};

struct Dep;

#[Injectable]
struct Needs {
    #[di(inject = "MISSING")]
    dep: Rc<Dep>,
}

#[Injectable]
struct Tolerant {
    #[di(inject = "MISSING", optional)]
    dep: Option<Rc<Dep>>,
}

struct NotMarked;

#[tokio::test]
async fn self_alias_is_rejected() {
    let error = Injector::create(vec![Provider::existing("A", "A")])
        .await
        .err()
        .unwrap();

    assert_eq!(error.kind(), ErrorKind::SelfAlias);
    assert!(error.to_string().contains("`A`"));
}

#[tokio::test]
async fn alias_of_an_unknown_token_is_rejected() {
    let error = Injector::create(vec![Provider::existing("A", "B")])
        .await
        .err()
        .unwrap();

    assert!(matches!(error, Error::NoProvider(token) if token == Token::from("B")));
}

#[tokio::test]
async fn missing_required_dependency_names_provider_and_index() {
    let error = Injector::create(vec![Provider::ty::<Needs>()])
        .await
        .err()
        .unwrap();

    assert_eq!(error.kind(), ErrorKind::NoProviderForToken);
    match error {
        Error::MissingDependency {
            provider,
            index,
            dependency,
        } => {
            assert_eq!(provider, Token::of::<Needs>());
            assert_eq!(index, 0);
            assert_eq!(dependency, Token::from("MISSING"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_optional_dependency_is_absent() {
    let injector = Injector::create(vec![Provider::ty::<Tolerant>()])
        .await
        .unwrap();

    let tolerant = injector.resolve::<Tolerant>().await.unwrap();
    assert!(tolerant.dep.is_none());
}

#[tokio::test]
async fn factory_dependencies_follow_the_same_rules() {
    let error = Injector::create(vec![Provider::factory(
        "F",
        [Dependency::optional("X"), Dependency::required("Y")],
        |_| Ok::<_, Error>(()),
    )])
    .await
    .err()
    .unwrap();

    assert!(matches!(error, Error::MissingDependency { index: 1, .. }));
}

#[tokio::test]
async fn declarations_need_a_token_and_a_strategy() {
    let no_strategy = Injector::create(vec![Declaration::new().provide("A").into()])
        .await
        .err()
        .unwrap();
    assert_eq!(no_strategy.kind(), ErrorKind::InvalidProviderDeclaration);

    let no_token = Injector::create(vec![Declaration::new().use_value(1).into()])
        .await
        .err()
        .unwrap();
    assert_eq!(no_token.kind(), ErrorKind::InvalidProviderDeclaration);
}

#[tokio::test]
async fn types_without_metadata_are_not_injectable() {
    let error = Injector::create(vec![Provider::ty::<NotMarked>()])
        .await
        .err()
        .unwrap();

    assert_eq!(error.kind(), ErrorKind::NotInjectable);
    assert!(error.to_string().contains("NotMarked"));
}

#[tokio::test]
async fn unresolved_parameter_needs_an_override() {
    struct Late;

    let metadata = || {
        InjectableMetadata::new(|args| {
            args.required::<u8>(0)?;
            Ok::<_, Error>(Late)
        })
        .unresolved_param()
    };

    let error = Injector::options()
        .metadata(metadata())
        .provider(Provider::ty::<Late>())
        .create()
        .await
        .err()
        .unwrap();
    assert!(matches!(error, Error::CircularTypeReference { index: 0, .. }));

    let injector = Injector::options()
        .metadata(metadata().inject(0, cavia::forward_ref(|| Token::from("LATE"))))
        .providers(vec![Provider::ty::<Late>(), Provider::value("LATE", 1_u8)])
        .create()
        .await
        .unwrap();
    assert!(injector.is_resolved(Token::of::<Late>()));
}

#[tokio::test]
async fn constructor_failures_carry_the_source() {
    let error = Injector::create(vec![Provider::factory("F", [], |_| {
        Err::<(), _>("connection refused")
    })])
    .await
    .err()
    .unwrap();

    assert_eq!(error.kind(), ErrorKind::Construction);
    assert_eq!(
        std::error::Error::source(&error).map(ToString::to_string),
        Some("connection refused".to_string())
    );
}

#[tokio::test]
async fn engine_errors_inside_constructors_pass_through() {
    let error = Injector::create(vec![
        Provider::value("PORT", 8080_u16),
        Provider::factory("F", ["PORT".into()], |args| {
            args.required::<String>(0)?;
            Ok::<_, Error>(())
        }),
    ])
    .await
    .err()
    .unwrap();

    assert_eq!(error.kind(), ErrorKind::TypeMismatch);
}

#[tokio::test]
async fn failures_are_not_cached() {
    let calls = Rc::new(Cell::new(0));

    let injector = Injector::options()
        .eager(false)
        .provider(Provider::factory("FLAKY", [], {
            let calls = Rc::clone(&calls);
            move |_| -> Result<u8, BoxError> {
                calls.set(calls.get() + 1);

                if calls.get() == 1 {
                    Err("first call fails".into())
                } else {
                    Ok(7)
                }
            }
        }))
        .create()
        .await
        .unwrap();

    assert!(injector.find("FLAKY").await.is_err());
    assert!(!injector.is_resolved("FLAKY"));

    assert_eq!(*injector.find_as::<u8>("FLAKY").await.unwrap().unwrap(), 7);
    assert_eq!(*injector.find_as::<u8>("FLAKY").await.unwrap().unwrap(), 7);
    assert_eq!(calls.get(), 2);
}
