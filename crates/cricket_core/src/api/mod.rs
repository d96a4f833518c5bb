pub mod config_env;
pub mod json_api;

pub use config_env::{engine_config_from_env, load_engine_config, ENGINE_CONFIG_PATH_ENV};
pub use json_api::{
    commentary_json, fixture_view, lifecycle_update_json, record_delivery_json, scorecard_json,
    snapshot, snapshot_json, win_probability_json, DeliveryRequest, DeliveryView, FixtureView,
    MatchSnapshot, RecordResponse, TeamRef,
};
