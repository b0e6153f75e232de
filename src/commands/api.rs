//! Remote API commands

use tracing::{info, warn};

use super::require_args;
use crate::api::{ApiCallSpec, ApiConfig, HttpMethod};
use crate::application::AppState;
use crate::error::CommandError;
use crate::parser::{extract_target, parse_flag, split_keywords};
use crate::toolkit::{bind_click, Callback};

/// `api設定 NAME URL key= username= password= show-secret=`
pub fn api_set(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    let (positional, params) = split_keywords(args);
    require_args("api設定", &positional, 2)?;
    let (name, url) = (&positional[0], &positional[1]);

    let config = ApiConfig {
        url: url.clone(),
        key: params.get("key").cloned(),
        username: params.get("username").cloned(),
        password: params.get("password").cloned(),
        show_secret: params
            .get("show-secret")
            .is_some_and(|flag| parse_flag(flag)),
    };
    app.apis().add_api(name, config);
    Ok(())
}

/// `api呼叫 BUTTON API METHOD PATH [BODY...] [-> TARGET]`
///
/// Binds the call to the button; nothing is sent until it is clicked.
pub fn api_call(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    let (args, target) = extract_target(args);
    require_args("api呼叫", &args, 4)?;
    let button = &args[0];

    let spec = ApiCallSpec {
        api: args[1].clone(),
        method: args[2].to_uppercase(),
        path: args[3].clone(),
        body_template: (args.len() > 4).then(|| args[4..].join(" ")),
        target,
    };
    if HttpMethod::parse(&spec.method).is_none() {
        warn!(method = %spec.method, button = %button, "API call bound with an invalid method");
    }

    let id = app
        .controls
        .get(button)
        .copied()
        .ok_or_else(|| CommandError::UnknownControl(button.clone()))?;
    info!(button = %button, api = %spec.api, method = %spec.method, path = %spec.path, "API call bound");
    bind_click(app.toolkit_mut(), id, Callback::ApiCall(spec))?;
    Ok(())
}

/// `api測試 API [-> TARGET]`: starts a background connection test
pub fn api_test(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    let (args, target) = extract_target(args);
    require_args("api測試", &args, 1)?;

    let remote = app
        .remote()
        .ok_or_else(|| CommandError::Failed("remote calls are not available".to_string()))?;
    remote.spawn_connection_test(&args[0], target);
    Ok(())
}
