use coupling_engine::core::workspace::WorkspaceArchive;
use coupling_engine::models::{NetworkComponent, TimeSeriesPlotComponent};
use coupling_engine::{ArchiveError, ConcurrencyMode, UpdaterConfig, Workspace};
use std::error::Error;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A clamped neuron and a free neuron feeding the two series of a plot
fn neuron_plot_workspace(mode: ConcurrencyMode) -> Result<Workspace, Box<dyn Error>> {
    let ws = Workspace::with_config(UpdaterConfig::new().with_concurrency(mode))?;

    let mut network = NetworkComponent::new();
    let clamped = network.add_neuron();
    clamped.set_activation(0.5);
    clamped.set_bias(0.5);
    clamped.set_clamped(true);
    network.add_neuron();
    let network = ws.add_component(network)?;
    let plot = ws.add_component(TimeSeriesPlotComponent::new(2))?;

    ws.couple(
        ws.producer(network.name(), "Neuron_1", "getActivation")?,
        ws.consumer(plot.name(), "Series_1", "setValue")?,
    )?;
    ws.couple(
        ws.producer(network.name(), "Neuron_2", "getActivation")?,
        ws.consumer(plot.name(), "Series_2", "setValue")?,
    )?;
    Ok(ws)
}

fn samples(ws: &Workspace, series: usize) -> Vec<(u64, f64)> {
    ws.component("TimeSeriesPlot1")
        .and_then(|plot| plot.inspect_as(|p: &TimeSeriesPlotComponent| p.series()[series].samples()))
        .unwrap()
}

#[test]
fn test_neuron_activations_reach_the_plot() -> Result<(), Box<dyn Error>> {
    init_logging();
    for mode in [ConcurrencyMode::Sequential, ConcurrencyMode::Rayon] {
        let ws = neuron_plot_workspace(mode)?;
        ws.iterate(2)?;

        assert_eq!(ws.time(), 2);
        assert_eq!(samples(&ws, 0), vec![(1, 0.5), (2, 0.5)]);
        assert_eq!(samples(&ws, 1), vec![(1, 0.0), (2, 0.0)]);
    }
    Ok(())
}

#[test]
fn test_forced_activation_crosses_in_one_cycle() -> Result<(), Box<dyn Error>> {
    init_logging();
    let ws = Workspace::new()?;
    let mut network = NetworkComponent::new();
    let first = network.add_neuron();
    let second = network.add_neuron();
    first.set_activation(1.0);
    first.set_clamped(true);
    ws.add_component(network)?;
    ws.couple_containers(("Network1", "Neuron_1"), ("Network1", "Neuron_2"))?;

    ws.run_once()?;
    assert_eq!(second.activation(), 1.0);
    Ok(())
}

#[test]
fn test_bias_shows_up_one_cycle_later() -> Result<(), Box<dyn Error>> {
    init_logging();
    let ws = neuron_plot_workspace(ConcurrencyMode::Rayon)?;
    ws.edit_component("Network1", |n: &mut NetworkComponent| {
        n.neuron("Neuron_2").map(|neuron| neuron.set_bias(0.25))
    })?
    .ok_or("missing Neuron_2")?;

    ws.iterate(3)?;
    // Cycle 1 reads the activation from before any update
    assert_eq!(samples(&ws, 1), vec![(1, 0.0), (2, 0.25), (3, 0.25)]);
    Ok(())
}

#[test]
fn test_save_and_reload() -> Result<(), Box<dyn Error>> {
    init_logging();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("workspace.json");

    let ws = neuron_plot_workspace(ConcurrencyMode::Sequential)?;
    ws.iterate(2)?;
    ws.component("TimeSeriesPlot1").unwrap().set_update_on(false);
    ws.save_to_path(&path)?;

    let reopened = Workspace::new()?;
    reopened.load_from_path(&path)?;

    assert_eq!(reopened.time(), 2);
    let names: Vec<String> = reopened.components().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, vec!["Network1", "TimeSeriesPlot1"]);
    assert!(!reopened.component("TimeSeriesPlot1").unwrap().is_update_on());

    let couplings = reopened.couplings();
    assert_eq!(couplings.len(), 2);
    assert_eq!(couplings[0].producer().container_id(), "Neuron_1");
    assert_eq!(couplings[1].consumer().container_id(), "Series_2");
    assert_eq!(samples(&reopened, 0), vec![(1, 0.5), (2, 0.5)]);

    // The reopened workspace keeps running from where it was saved
    reopened.component("TimeSeriesPlot1").unwrap().set_update_on(true);
    reopened.run_once()?;
    assert_eq!(reopened.time(), 3);
    assert_eq!(samples(&reopened, 0).last(), Some(&(3, 0.5)));
    Ok(())
}

#[test]
fn test_archive_with_missing_attribute_is_rejected() -> Result<(), Box<dyn Error>> {
    init_logging();
    let ws = neuron_plot_workspace(ConcurrencyMode::Sequential)?;
    let mut archive = ws.to_archive()?;
    archive.couplings[0].consumer.container = "Series_7".to_string();

    let json = serde_json::to_string(&archive)?;
    let target = Workspace::new()?;
    let err = target.load(json.as_bytes()).unwrap_err();
    match err {
        ArchiveError::UnresolvedAttribute { component, container, accessor } => {
            assert_eq!(component, "TimeSeriesPlot1");
            assert_eq!(container, "Series_7");
            assert_eq!(accessor, "setValue");
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn test_archive_with_unknown_kind_is_rejected() -> Result<(), Box<dyn Error>> {
    init_logging();
    let archive: WorkspaceArchive = serde_json::from_str(
        r#"{
            "time": 4,
            "components": [{ "kind": "OdorWorld", "name": "World1", "state": {} }],
            "couplings": []
        }"#,
    )?;
    let ws = Workspace::new()?;
    let err = ws.restore(archive).unwrap_err();
    assert!(matches!(err, ArchiveError::UnknownComponentKind(kind) if kind == "OdorWorld"));
    Ok(())
}
