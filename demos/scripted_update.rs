//! Replaces the default update with a hand-written action sequence: update
//! the network, push its activation to the plot within the same cycle, then
//! update the plot. A non-removable action reports progress.
use coupling_engine::models::{NetworkComponent, TimeSeriesPlotComponent};
use coupling_engine::{update_action, ConcurrencyMode, UpdaterConfig, Workspace};
use log::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    let ws = Workspace::with_config(UpdaterConfig::new().with_concurrency(ConcurrencyMode::Sequential))?;

    let mut network = NetworkComponent::new();
    let neuron = network.add_neuron();
    neuron.set_bias(0.5);
    ws.add_named_component("net", network)?;
    ws.add_named_component("plot", TimeSeriesPlotComponent::new(1))?;
    ws.couple(
        ws.producer("net", "Neuron_1", "getActivation")?,
        ws.consumer("plot", "Series_1", "setValue")?,
    )?;

    let available = ws.available_actions();
    for (index, action) in available.iter().enumerate() {
        println!("[{}] {} - {}", index, action.description(), action.long_description());
    }

    // available: update all, net, plot, the coupling
    let actions = ws.updater().actions();
    actions.clear();
    actions.add_action(available[1].clone());
    actions.add_action(available[3].clone());
    actions.add_action(available[2].clone());
    ws.add_non_removable_action(update_action("Report", |cycle| {
        info!("cycle {} finished", cycle.time);
        Ok(())
    }));

    ws.iterate(3)?;

    ws.component("plot")
        .and_then(|plot| plot.inspect_as(|p: &TimeSeriesPlotComponent| p.series()[0].samples()))
        .into_iter()
        .flatten()
        .for_each(|(time, value)| println!("t={} value={}", time, value));
    Ok(())
}
