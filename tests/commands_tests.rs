//! Tests for the command layer driving introspection and the runner.

mod common;

use bay::commands::{self, CommandContext};
use bay::error::BayError;
use bay::formation::Host;
use common::{MockGateway, Op, demo_set};

fn ctx(gateway: &MockGateway) -> CommandContext<'_, MockGateway> {
    CommandContext {
        gateway,
        containers: demo_set(),
        host: Host::default_host(),
    }
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|name| name.to_string()).collect()
}

#[tokio::test]
async fn run_starts_the_link_closure_in_order() {
    let gateway = MockGateway::new(&["web:latest", "db:latest"], &[]);

    commands::run(&ctx(&gateway), &names(&["web"]), false)
        .await
        .unwrap();

    assert_eq!(
        gateway.ops(),
        vec![Op::Start("db".to_string()), Op::Start("web".to_string())]
    );
}

#[tokio::test]
async fn run_on_running_containers_is_a_noop() {
    let gateway = MockGateway::new(
        &["web:latest", "db:latest"],
        &[("web", "web:latest"), ("db", "db:latest")],
    );

    commands::run(&ctx(&gateway), &names(&["web"]), false)
        .await
        .unwrap();

    assert!(gateway.ops().is_empty());
}

#[tokio::test]
async fn run_with_missing_linked_image_starts_nothing() {
    let gateway = MockGateway::new(&["web:latest"], &[]);

    let err = commands::run(&ctx(&gateway), &names(&["web"]), false)
        .await
        .unwrap_err();

    match err {
        BayError::ImageNotFound { image, dependent } => {
            assert_eq!(image, "db:latest");
            assert_eq!(dependent.as_deref(), Some("web"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(gateway.ops().is_empty());
}

#[tokio::test]
async fn run_collects_errors_for_every_named_container() {
    let gateway = MockGateway::new(&[], &[]);

    let err = commands::run(&ctx(&gateway), &names(&["web", "worker"]), false)
        .await
        .unwrap_err();

    // the last failure comes back; earlier ones are reported on stderr
    assert!(matches!(err, BayError::ImageNotFound { .. }));
    assert!(gateway.ops().is_empty(), "nothing starts when adds failed");
}

#[tokio::test]
async fn run_tail_follows_the_single_container() {
    let gateway = MockGateway::new(&["web:latest", "db:latest"], &[]);

    commands::run(&ctx(&gateway), &names(&["web"]), true)
        .await
        .unwrap();

    let ops = gateway.ops();
    assert_eq!(ops.last(), Some(&Op::Tail("web".to_string(), true)));
}

#[tokio::test]
async fn run_tail_refuses_multiple_containers() {
    let gateway = MockGateway::new(&["web:latest", "db:latest"], &[]);

    let err = commands::run(&ctx(&gateway), &names(&["web", "db"]), true)
        .await
        .unwrap_err();

    assert!(matches!(err, BayError::Usage(_)));
    assert_eq!(gateway.call_count(), 0, "rejected before touching the host");
}

#[tokio::test]
async fn stop_without_names_spares_system_containers() {
    let gateway = MockGateway::new(
        &["web:latest", "db:latest", "proxy:latest"],
        &[
            ("web", "web:latest"),
            ("db", "db:latest"),
            ("proxy", "proxy:latest"),
        ],
    );

    commands::stop(&ctx(&gateway), &[]).await.unwrap();

    assert_eq!(
        gateway.ops(),
        vec![Op::Stop("web".to_string()), Op::Stop("db".to_string())],
        "dependents first, proxy untouched"
    );
}

#[tokio::test]
async fn stop_named_dependency_stops_its_dependents() {
    let gateway = MockGateway::new(
        &["web:latest", "db:latest"],
        &[("web", "web:latest"), ("db", "db:latest")],
    );

    commands::stop(&ctx(&gateway), &names(&["db"])).await.unwrap();

    assert_eq!(
        gateway.ops(),
        vec![Op::Stop("web".to_string()), Op::Stop("db".to_string())]
    );
}

#[tokio::test]
async fn stop_unknown_container_fails() {
    let gateway = MockGateway::new(&[], &[]);

    let err = commands::stop(&ctx(&gateway), &names(&["ghost"]))
        .await
        .unwrap_err();

    assert!(matches!(err, BayError::UnknownContainer(_)));
}

#[tokio::test]
async fn shell_refuses_more_than_one_container() {
    let gateway = MockGateway::new(&["web:latest", "db:latest"], &[]);

    let err = commands::shell(&ctx(&gateway), &names(&["web", "db"]), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, BayError::Usage(_)));
    assert_eq!(gateway.call_count(), 0, "no runner, no gateway calls");
}

#[tokio::test]
async fn shell_forces_foreground_and_default_command() {
    let gateway = MockGateway::new(&["db:latest"], &[]);

    commands::shell(&ctx(&gateway), &names(&["db"]), &[])
        .await
        .unwrap();

    let starts = gateway.starts();
    assert_eq!(starts.len(), 1);
    assert!(starts[0].foreground);
    assert_eq!(
        starts[0].command.as_deref(),
        Some(&["/bin/sh".to_string()][..])
    );
}

#[tokio::test]
async fn shell_attaches_after_the_container_boots() {
    let gateway = MockGateway::new(&["db:latest"], &[]);

    commands::shell(&ctx(&gateway), &names(&["db"]), &[])
        .await
        .unwrap();

    assert_eq!(
        gateway.ops(),
        vec![Op::Start("db".to_string()), Op::Attach("db".to_string())],
        "the interactive session opens once the container is up"
    );
}

#[tokio::test]
async fn shell_on_running_container_just_attaches() {
    let gateway = MockGateway::new(&["db:latest"], &[("db", "db:latest")]);

    commands::shell(&ctx(&gateway), &names(&["db"]), &[])
        .await
        .unwrap();

    assert_eq!(gateway.ops(), vec![Op::Attach("db".to_string())]);
}

#[tokio::test]
async fn shell_passes_the_command_override() {
    let gateway = MockGateway::new(&["db:latest"], &[]);

    commands::shell(&ctx(&gateway), &names(&["db"]), &names(&["psql", "-U", "app"]))
        .await
        .unwrap();

    let starts = gateway.starts();
    assert_eq!(
        starts[0].command.as_deref().unwrap(),
        &["psql".to_string(), "-U".to_string(), "app".to_string()]
    );
}

#[tokio::test]
async fn restart_is_stop_followed_by_run() {
    let initial = &[("web", "web:latest"), ("db", "db:latest")];
    let images = &["web:latest", "db:latest", "worker:latest"];

    let composed = MockGateway::new(images, initial);
    commands::restart(&ctx(&composed), &names(&["web"]))
        .await
        .unwrap();

    let sequential = MockGateway::new(images, initial);
    commands::stop(&ctx(&sequential), &names(&["web"]))
        .await
        .unwrap();
    commands::run(&ctx(&sequential), &names(&["web"]), false)
        .await
        .unwrap();

    assert_eq!(composed.ops(), sequential.ops());
    assert_eq!(
        composed.ops(),
        vec![Op::Stop("web".to_string()), Op::Start("web".to_string())]
    );
}

#[tokio::test]
async fn restart_without_names_is_stop_followed_by_up() {
    let initial = &[
        ("web", "web:latest"),
        ("db", "db:latest"),
        ("proxy", "proxy:latest"),
    ];
    let images = &["web:latest", "db:latest", "worker:latest", "proxy:latest"];

    let composed = MockGateway::new(images, initial);
    commands::restart(&ctx(&composed), &[]).await.unwrap();

    let sequential = MockGateway::new(images, initial);
    commands::stop(&ctx(&sequential), &[]).await.unwrap();
    commands::up(&ctx(&sequential)).await.unwrap();

    assert_eq!(composed.ops(), sequential.ops());
}

#[tokio::test]
async fn up_starts_every_non_system_container() {
    let gateway = MockGateway::new(
        &["web:latest", "db:latest", "worker:latest", "proxy:latest"],
        &[],
    );

    commands::up(&ctx(&gateway)).await.unwrap();

    let ops = gateway.ops();
    assert_eq!(ops[0], Op::Start("db".to_string()));
    assert!(ops.contains(&Op::Start("web".to_string())));
    assert!(ops.contains(&Op::Start("worker".to_string())));
    assert!(!ops.contains(&Op::Start("proxy".to_string())));
}

#[tokio::test]
async fn unreachable_runtime_propagates() {
    let mut gateway = MockGateway::new(&["web:latest", "db:latest"], &[]);
    gateway.unreachable = true;

    let err = commands::run(&ctx(&gateway), &names(&["web"]), false)
        .await
        .unwrap_err();

    assert!(matches!(err, BayError::RuntimeUnavailable(_)));
}

#[tokio::test]
async fn tail_requires_a_known_container() {
    let gateway = MockGateway::new(&[], &[]);

    let err = commands::tail(&ctx(&gateway), "ghost", false)
        .await
        .unwrap_err();

    assert!(matches!(err, BayError::UnknownContainer(_)));
    assert!(gateway.ops().is_empty());
}
