use behavior_plan::prelude::*;
use behavior_plan::{CommandLifecycle, NodeError};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

struct Noop;

#[async_trait]
impl Action for Noop {
    async fn call(&self, _args: &ActionArgs) -> Result<(), BoxError> {
        Ok(())
    }
}

fn threshold_plan(name: &str, threshold: usize) -> Plan {
    Plan::from_fn(name, move |ctx: &PlanContext| {
        let mut evaluations = 0;
        Ok(ctx
            .condition("counter_reached", move || {
                evaluations += 1;
                evaluations >= threshold
            })
            .into())
    })
    .unwrap()
}

#[test]
fn test_condition_plan_done_exactly_at_threshold() {
    let mut plan = threshold_plan("counter", 4);

    for tick in 1..=3 {
        plan.tick_once().unwrap();
        assert!(!plan.is_done(), "done too early at tick {}", tick);
        assert_eq!(plan.root_status(), Status::Running);
    }

    plan.tick_once().unwrap();
    assert!(plan.is_done());
    assert_eq!(plan.root_status(), Status::Success);
    assert_eq!(plan.tick_count(), 4);
}

#[test]
fn test_tick_once_is_noop_after_done() {
    let mut plan = threshold_plan("instant", 1);
    plan.tick_once().unwrap();
    assert!(plan.is_done());

    for _ in 0..3 {
        plan.tick_once().unwrap();
    }
    assert_eq!(plan.tick_count(), 1);
}

#[test]
fn test_duplicate_command_names_rejected() {
    let result = Plan::from_fn("twins", |ctx: &PlanContext| {
        Ok(Sequence::new(
            "root",
            vec![
                ctx.command("grasp", Noop, ActionArgs::new()).into(),
                ctx.command("grasp", Noop, ActionArgs::new()).into(),
            ],
        )
        .into())
    });

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        PlanError::DuplicateNodeName { ref plan, ref name } if plan == "twins" && name == "grasp"
    ));
}

#[test]
fn test_condition_names_may_repeat() {
    let plan = Plan::from_fn("checks", |ctx: &PlanContext| {
        Ok(Sequence::new(
            "root",
            vec![
                ctx.condition("ok", || true).into(),
                ctx.condition("ok", || true).into(),
            ],
        )
        .into())
    });
    assert!(plan.is_ok());
}

#[test]
fn test_factory_error_propagates() {
    let result = Plan::from_fn("broken", |_ctx: &PlanContext| {
        Err(PlanError::ConfigError("no gripper configured".to_string()))
    });
    assert!(matches!(result, Err(PlanError::ConfigError(_))));
}

struct PickTree {
    target: &'static str,
}

impl TreeFactory for PickTree {
    fn create_tree(&self, ctx: &PlanContext) -> PlanResult<TreeNode> {
        let args = ActionArgs::new().arg(json!(self.target));
        Ok(Sequence::new(
            "pick",
            vec![
                ctx.condition("target_visible", || true).into(),
                ctx.command("grasp", Noop, args).into(),
            ],
        )
        .into())
    }
}

#[test]
fn test_strategy_factory_and_render() {
    let config = EngineConfig::default().with_verbose(false);
    let mut plan = Plan::with_config("picker", PickTree { target: "bolt" }, &config).unwrap();
    assert_eq!(plan.name(), "picker");
    assert_eq!(
        plan.render(),
        "[-] pick [-]\n    --> target_visible [-]\n    --> grasp [-]\n"
    );

    plan.tick_once().unwrap();
    assert_eq!(
        plan.render(),
        "[-] pick [running]\n    --> target_visible [success]\n    --> grasp [running]\n"
    );
    assert_eq!(
        plan.status_map().get("grasp"),
        Some(CommandLifecycle::Running)
    );
}

#[test]
fn test_executor_can_only_be_taken_once() {
    let mut plan = threshold_plan("single", 1);
    let executor = plan.executor().unwrap();
    assert_eq!(executor.plan_name(), "single");

    assert!(matches!(plan.executor(), Err(PlanError::ExecutorTaken(ref p)) if p == "single"));
}

#[test]
fn test_spawn_executor_requires_runtime() {
    let mut plan = threshold_plan("no_runtime", 1);
    assert!(matches!(
        plan.spawn_executor(Duration::from_millis(1)),
        Err(PlanError::RuntimeError(_))
    ));
    // the executor is still available afterwards
    assert!(plan.executor().is_ok());
}

#[test]
fn test_predicate_error_fails_tick() {
    let mut plan = Plan::from_fn("faulty", |ctx: &PlanContext| {
        Ok(ctx
            .fallible_condition("lidar_ok", || Err("lidar disconnected".into()))
            .into())
    })
    .unwrap();

    let err = plan.tick_once().unwrap_err();
    assert!(matches!(
        err,
        PlanError::NodeError(NodeError::PredicateFailed { .. })
    ));
    assert!(!plan.is_done());
}

#[test]
fn test_executor_exits_when_plan_dropped() {
    let mut plan = threshold_plan("dropped", 10);
    let executor = plan.executor().unwrap();
    drop(plan);

    let result = tokio_test::block_on(executor.run(Duration::from_millis(1)));
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_command_plan_done_on_first_tick_after_completion() {
    let finished = Arc::new(AtomicBool::new(false));
    let finished_in_factory = finished.clone();

    let mut plan = Plan::from_fn("delayed", move |ctx: &PlanContext| {
        let finished = finished_in_factory.clone();
        let action = FnAction::new("slow_move", move |_args: ActionArgs| {
            let finished = finished.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                finished.store(true, Ordering::SeqCst);
                Ok::<(), BoxError>(())
            }
        });
        Ok(ctx.command("slow_move", action, ActionArgs::new()).into())
    })
    .unwrap();

    let executor = plan.spawn_executor(Duration::from_millis(1)).unwrap();

    let mut ticks = 0;
    loop {
        let finished_before_tick = finished.load(Ordering::SeqCst);
        plan.tick_once().unwrap();
        ticks += 1;
        assert_eq!(plan.is_done(), finished_before_tick);
        if plan.is_done() {
            break;
        }
        assert!(ticks < 1000, "plan never finished");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(ticks >= 2);
    assert_eq!(
        plan.status_map().get("slow_move"),
        Some(CommandLifecycle::Complete)
    );
    executor.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_action_called_once_with_bound_args() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_factory = calls.clone();

    let mut plan = Plan::from_fn("args", move |ctx: &PlanContext| {
        let calls = calls_in_factory.clone();
        let action = FnAction::new("record", move |args: ActionArgs| {
            let calls = calls.clone();
            async move {
                assert_eq!(args.get(0), Some(&json!("shelf_3")));
                assert_eq!(args.get_named("speed"), Some(&json!(0.5)));
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<(), BoxError>(())
            }
        });
        let args = ActionArgs::new()
            .arg(json!("shelf_3"))
            .named("speed", json!(0.5));
        Ok(ctx.command("record", action, args).into())
    })
    .unwrap();

    let executor = plan.spawn_executor(Duration::from_millis(1)).unwrap();
    let mut plans = [plan];
    merged_loop_async(&mut plans, Duration::from_millis(2))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    executor.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_action_failure_surfaces_on_next_tick() {
    let mut plan = Plan::from_fn("jammed", |ctx: &PlanContext| {
        let action = FnAction::new("grip", |_args: ActionArgs| async {
            Err::<(), BoxError>("gripper jammed".into())
        });
        Ok(ctx.command("grip", action, ActionArgs::new()).into())
    })
    .unwrap();

    let executor = plan.spawn_executor(Duration::from_millis(1)).unwrap();

    let mut failure = None;
    for _ in 0..200 {
        if let Err(err) = plan.tick_once() {
            failure = Some(err);
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let failure = failure.expect("tick never reported the executor failure");
    assert!(matches!(failure, PlanError::ExecutorFailed { ref plan, .. } if plan == "jammed"));
    assert!(failure.to_string().contains("gripper jammed"));
    assert!(!plan.is_done());

    let executor_result = executor.await.unwrap();
    assert!(matches!(
        executor_result,
        Err(PlanError::ActionFailed { ref node, .. }) if node == "grip"
    ));
}

#[cfg(feature = "builtin-nodes")]
#[tokio::test]
async fn test_flag_set_by_command_releases_condition() {
    let flag = Flag::new();
    let flag_in_factory = flag.clone();

    let mut plan = Plan::from_fn("handshake", move |ctx: &PlanContext| {
        Ok(Sequence::new(
            "root",
            vec![
                ctx.command("raise", flag_in_factory.set_action(), ActionArgs::new())
                    .into(),
                ctx.condition("raised", flag_in_factory.predicate()).into(),
            ],
        )
        .into())
    })
    .unwrap();

    let executor = plan.spawn_executor(Duration::from_millis(1)).unwrap();
    let mut plans = [plan];
    merged_loop_async(&mut plans, Duration::from_millis(2))
        .await
        .unwrap();

    assert!(flag.is_set());
    assert!(plans[0].is_done());
    executor.await.unwrap().unwrap();
}

#[cfg(feature = "builtin-nodes")]
#[test]
fn test_thread_model_with_blocking_loop() {
    let mut plan = Plan::from_fn("threaded", |ctx: &PlanContext| {
        Ok(ctx
            .command(
                "settle",
                DelayAction::new(Duration::from_millis(20)),
                ActionArgs::new(),
            )
            .into())
    })
    .unwrap();

    let executor = plan
        .spawn_executor_thread(Duration::from_millis(1))
        .unwrap();
    let mut plans = vec![plan];
    let report = merged_loop(&mut plans, Duration::from_millis(2)).unwrap();

    assert!(plans[0].is_done());
    assert!(report.rounds >= 2);
    assert!(report.elapsed >= Duration::from_millis(20));
    executor.join().unwrap().unwrap();
}

#[test]
fn test_thread_executor_runs_io_actions() {
    let mut plan = Plan::from_fn("listener", |ctx: &PlanContext| {
        let open_port = FnAction::new("open_port", |_args: ActionArgs| async {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
            listener.local_addr()?;
            Ok::<(), BoxError>(())
        });
        Ok(ctx.command("open_port", open_port, ActionArgs::new()).into())
    })
    .unwrap();

    let executor = plan
        .spawn_executor_thread(Duration::from_millis(1))
        .unwrap();
    let mut plans = vec![plan];
    let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_millis(2)).max_rounds(500));
    scheduler.run(&mut plans).unwrap();

    assert!(plans[0].is_done());
    assert_eq!(
        plans[0].status_map().get("open_port"),
        Some(CommandLifecycle::Complete)
    );
    executor.join().unwrap().unwrap();
}

#[test]
fn test_panicking_action_fails_the_plan() {
    let mut plan = Plan::from_fn("crashing", |ctx: &PlanContext| {
        let crash = FnAction::new("crash", |_args: ActionArgs| async {
            if true {
                panic!("servo driver crashed");
            }
            Ok::<(), BoxError>(())
        });
        Ok(ctx.command("crash", crash, ActionArgs::new()).into())
    })
    .unwrap();

    let executor = plan
        .spawn_executor_thread(Duration::from_millis(1))
        .unwrap();
    let mut plans = vec![plan];
    let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_millis(2)).max_rounds(500));
    let err = scheduler.run(&mut plans).unwrap_err();

    assert!(matches!(err, PlanError::ExecutorFailed { ref plan, .. } if plan == "crashing"));
    assert!(err.to_string().contains("servo driver crashed"));
    assert!(!plans[0].is_done());

    // the thread itself returns the failure instead of unwinding
    let executor_result = executor.join().unwrap();
    assert!(matches!(
        executor_result,
        Err(PlanError::ActionFailed { ref node, .. }) if node == "crash"
    ));
}
