use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::{ProbeConfig, SweepConfig};
use crate::persistence;
use crate::probe::LivenessProbe;

/// Shared application state passed into handlers and the sweep task.
#[derive(Clone)]
pub struct AppState {
    pub db: persistence::Db,
    pub probe: LivenessProbe,
    pub probe_cfg: ProbeConfig,
    pub sweep_cfg: SweepConfig,
    pub metrics_handle: PrometheusHandle,
    pub schema: persistence::MigrationSnapshot,
}

#[allow(dead_code)]
fn _assert_app_state_bounds() {
    fn assert_bounds<T: Clone + Send + Sync + 'static>() {}
    assert_bounds::<AppState>();
}
