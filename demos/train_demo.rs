//! Training-style run of the adaptive scheduler.
//!
//! A batch of 4 cost matrices (N = 10) whose noise shrinks over the first
//! 20 epochs stands in for a model that is still learning its costs. The
//! scheduler brakes while the plans drift and cools once they settle.
//!
//! Run with `RUST_LOG=info cargo run --example train_demo`
//! (`RUST_LOG=debug` also shows every scheduler decision).

use eph_anneal::schedule::{AdaptiveScheduler, FixedSchedule, SchedulerConfig};
use eph_anneal::simulation::{CostNoise, SimulationConfig};
use eph_anneal::sinkhorn::SinkhornLayer;

fn main() -> eph_anneal::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SimulationConfig::default()
        .with_batch_size(4)
        .with_n_points(10)
        .with_epochs(50)
        .with_noise(CostNoise::Decaying {
            floor: 0.1,
            horizon: 20.0,
        });
    let layer = SinkhornLayer::new(config.sinkhorn_iterations);
    let mut scheduler = AdaptiveScheduler::new(SchedulerConfig::new(1.0, 0.01, 0.95, 0.5))?;
    let standard = FixedSchedule::new(*scheduler.config())?;

    log::info!("initializing simulation with {:?}", scheduler.config());

    for (epoch, cost) in config.cost_stream()?.iter().enumerate() {
        let current = scheduler.epsilon();
        let plan = layer.forward(cost, current)?;
        scheduler.observe(&plan)?;

        let status = match scheduler.history().last() {
            None => "WARMUP",
            Some(record) if record.braking => "BRAKING",
            Some(_) if scheduler.is_at_floor() => "FLOOR",
            Some(_) => "COOLING",
        };
        log::info!(
            "epoch {:02}: eps={:.4} (standard {:.4}) entropy={:.4} | {}",
            epoch + 1,
            current,
            standard.epsilon_at(epoch),
            plan.entropy(),
            status
        );
    }

    log::info!(
        "final eps={:.4}, braked {} of {} steps",
        scheduler.epsilon(),
        scheduler.braking_steps(),
        scheduler.history().len()
    );
    Ok(())
}
