//! 🤖 Two Robots, One Loop
//!
//! Two pick-and-place plans ticked by one cooperative scheduler. Each plan
//! waits for a part to come within reach, moves its arm, closes the gripper,
//! then hands the part over through a shared flag that the other robot waits on.
//!
//! Run with `RUST_LOG=debug` to see every tick.

use behavior_plan::logging;
use behavior_plan::prelude::*;
use serde_json::json;
use std::time::Duration;

fn pick_plan(
    robot: &'static str,
    part_arrives_after: usize,
    handover: Flag,
    config: &EngineConfig,
) -> PlanResult<Plan> {
    Plan::with_config(
        robot,
        move |ctx: &PlanContext| -> PlanResult<TreeNode> {
            let mut conveyor_ticks = 0;
            let part_in_range = ctx.condition("part_in_range", move || {
                conveyor_ticks += 1;
                conveyor_ticks >= part_arrives_after
            });

            let move_arm = ctx.command(
                "move_arm",
                DelayAction::new(Duration::from_millis(300)),
                ActionArgs::new().arg(json!(robot)).arg(json!([0.4, 0.1, 0.2])),
            );
            let close_gripper = ctx.command(
                "close_gripper",
                DelayAction::new(Duration::from_millis(100)),
                ActionArgs::new().named("ms", json!(150)),
            );

            Ok(Sequence::new(
                "pick",
                vec![
                    part_in_range.into(),
                    move_arm.into(),
                    close_gripper.into(),
                    ctx.command("hand_over", handover.set_action(), ActionArgs::new())
                        .into(),
                ],
            )
            .into())
        },
        config,
    )
}

fn receive_plan(handover: Flag, config: &EngineConfig) -> PlanResult<Plan> {
    Plan::with_config(
        "receiver",
        move |ctx: &PlanContext| -> PlanResult<TreeNode> {
            Ok(Sequence::new(
                "receive",
                vec![
                    ctx.condition("part_handed_over", handover.predicate()).into(),
                    ctx.command(
                        "store_part",
                        LogAction::new("part stored"),
                        ActionArgs::new().named("bin", json!(7)),
                    )
                    .into(),
                ],
            )
            .into())
        },
        config,
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = EngineConfig::default()
        .with_tick_interval(Duration::from_millis(50))
        .with_poll_interval(Duration::from_millis(20))
        .with_max_rounds(500);
    config.validate()?;

    println!("🤖 Building plans...");
    let handover = Flag::new();
    let mut plans = vec![
        pick_plan("picker", 5, handover.clone(), &config)?,
        receive_plan(handover, &config)?,
    ];

    let mut executors = Vec::new();
    for plan in plans.iter_mut() {
        executors.push(plan.spawn_executor(config.poll_interval())?);
    }

    println!("🚀 Running {} plans cooperatively...\n", plans.len());
    let report = Scheduler::new(config.scheduler())
        .run_async(&mut plans)
        .await?;

    for executor in executors {
        executor.await??;
    }

    println!("\n📊 Results:");
    println!("  🔁 Rounds: {}", report.rounds);
    println!("  ⏱️  Elapsed: {:?}", report.elapsed);
    for plan in &plans {
        println!("\n🌳 {} ({} ticks)", plan.name(), plan.tick_count());
        print!("{}", plan.render());
    }

    Ok(())
}
