//! Couples a small noisy network to a time series plot, runs it in the
//! background for a while and prints what the plot recorded.
//!
//! Usage: neuron_plot [archive.json]
use coupling_engine::models::{NetworkComponent, TimeSeriesPlotComponent};
use coupling_engine::{ActionProfiler, UpdaterConfig, Workspace};
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    let config = UpdaterConfig::new().with_update_delay(Duration::from_millis(2));
    let ws = Workspace::with_config(config)?;

    let mut network = NetworkComponent::new().with_noise(0.1);
    let driver = network.add_neuron();
    driver.set_activation(1.0);
    driver.set_clamped(true);
    let follower = network.add_neuron();
    follower.set_bias(-0.2);
    let network = ws.add_component(network)?;
    let plot = ws.add_component(TimeSeriesPlotComponent::new(2))?;

    // Neuron_1 drives Neuron_2, both are plotted
    ws.couple(
        ws.producer(network.name(), "Neuron_1", "getActivation")?,
        ws.consumer(network.name(), "Neuron_2", "addInputValue")?,
    )?;
    for (neuron, series) in [("Neuron_1", "Series_1"), ("Neuron_2", "Series_2")] {
        ws.couple(
            ws.producer(network.name(), neuron, "getActivation")?,
            ws.consumer(plot.name(), series, "setValue")?,
        )?;
    }

    let (profiler, records) = ActionProfiler::channel();
    ws.updater().set_profiler(Some(profiler));

    let run = ws.updater().spawn_run()?;
    thread::sleep(Duration::from_millis(50));
    ws.stop();
    run.join().map_err(|_| "updater thread panicked")??;

    println!("Ran {} cycles", ws.time());
    let total: u64 = records.try_iter().map(|r| r.elapsed_nanos).sum();
    println!("Time spent in update actions: {} us", total / 1_000);

    plot.inspect_as(|p: &TimeSeriesPlotComponent| {
        for series in p.series() {
            let samples = series.samples();
            let tail: Vec<String> = samples
                .iter()
                .rev()
                .take(5)
                .rev()
                .map(|(t, v)| format!("{}:{:.3}", t, v))
                .collect();
            println!("{} ({} samples) ... {}", series.id(), samples.len(), tail.join(" "));
        }
    });

    if let Some(path) = std::env::args().nth(1) {
        ws.save_to_path(&path)?;
        println!("Saved workspace to {}", path);
    }
    Ok(())
}
