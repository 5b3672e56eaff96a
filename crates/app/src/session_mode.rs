//! Headless session loop: reads JSON commands from stdin and writes JSON
//! responses to stdout.
//!
//! ## Protocol
//!
//! Each line of stdin is a JSON object with a `"cmd"` discriminator.
//! Each line of stdout is a JSON response with `"protocol_version"` and
//! `"type"` fields. See [`engine::command_protocol`] for the schema.
//!
//! Every command except `quit` is answered with an observation taken after
//! the remote calls it started have landed (or `settle_timeout` passed).

use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

use bevy::prelude::*;

use engine::command_protocol::{
    make_response, ResponsePayload, SessionCommand, SessionResponse, PROTOCOL_VERSION,
};
use engine::in_flight_requests;
use engine::observation::observe;

/// Pause between updates while waiting on remote calls.
const SETTLE_POLL: Duration = Duration::from_millis(5);

pub fn run_session_mode(app: App, settle_timeout: Duration) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_session(app, stdin.lock(), stdout.lock(), settle_timeout)
}

pub fn run_session<R: BufRead, W: Write>(
    mut app: App,
    input: R,
    mut output: W,
    settle_timeout: Duration,
) -> io::Result<()> {
    // Startup systems, then let the initial risk fetch land.
    app.update();
    settle(&mut app, settle_timeout);

    emit(&mut output, &make_response(ResponsePayload::Ready))?;
    info!("Session protocol v{PROTOCOL_VERSION} ready, waiting for commands on stdin");

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = process_line(&mut app, &line, settle_timeout);
        let is_goodbye = matches!(response.payload, ResponsePayload::Goodbye);
        emit(&mut output, &response)?;
        if is_goodbye {
            break;
        }
    }

    info!("Session shutting down");
    Ok(())
}

fn emit<W: Write>(output: &mut W, response: &SessionResponse) -> io::Result<()> {
    writeln!(output, "{}", serde_json::to_string(response)?)?;
    output.flush()
}

fn process_line(app: &mut App, line: &str, settle_timeout: Duration) -> SessionResponse {
    let command: SessionCommand = match serde_json::from_str(line) {
        Ok(c) => c,
        Err(e) => {
            return make_response(ResponsePayload::Error {
                message: format!("Parse error: {e}"),
            })
        }
    };
    if matches!(command, SessionCommand::Quit) {
        return make_response(ResponsePayload::Goodbye);
    }

    let actions = match command.into_actions() {
        Ok(actions) => actions,
        Err(message) => return make_response(ResponsePayload::Error { message }),
    };
    for action in actions {
        debug!("Session command -> {}", action.name());
        app.world_mut().send_event(action);
    }
    app.update();
    settle(app, settle_timeout);

    make_response(ResponsePayload::Observation {
        observation: Box::new(observe(app.world())),
    })
}

/// Run updates until no remote call is outstanding or `timeout` passes.
fn settle(app: &mut App, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while in_flight_requests(app.world()) > 0 {
        if Instant::now() >= deadline {
            warn!(
                "{} remote call(s) still running after {:?}",
                in_flight_requests(app.world()),
                timeout
            );
            break;
        }
        std::thread::sleep(SETTLE_POLL);
        app.update();
    }
    // Statuses raised by the last collection are recorded on this pass.
    app.update();
}

#[cfg(test)]
mod tests {
    use engine::prediction::PredictionService;
    use engine::test_harness::{test_settings, StubBackend};
    use engine::EnginePlugin;
    use serde_json::Value;

    use super::*;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(test_settings())
            .insert_resource(PredictionService::new(StubBackend::default()))
            .add_plugins(EnginePlugin);
        app
    }

    fn run_script(script: &str) -> Vec<Value> {
        let mut out = Vec::new();
        run_session(
            test_app(),
            script.as_bytes(),
            &mut out,
            Duration::from_secs(5),
        )
        .unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_ready_observe_quit() {
        let responses = run_script("{\"cmd\":\"observe\"}\n{\"cmd\":\"quit\"}\n");
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["type"], "ready");
        assert_eq!(responses[0]["protocol_version"], PROTOCOL_VERSION);
        assert_eq!(responses[1]["type"], "observation");
        assert_eq!(responses[1]["observation"]["readiness"], 91);
        assert_eq!(responses[2]["type"], "goodbye");
    }

    #[test]
    fn test_bad_lines_answered_with_errors() {
        let responses = run_script(
            "not json\n\n{\"cmd\":\"select_region\",\"region\":\"atlantis\"}\n{\"cmd\":\"quit\"}\n",
        );
        assert_eq!(responses.len(), 4);
        assert_eq!(responses[1]["type"], "error");
        assert!(responses[1]["message"]
            .as_str()
            .unwrap()
            .starts_with("Parse error"));
        assert_eq!(responses[2]["type"], "error");
        assert_eq!(responses[2]["message"], "unknown region `atlantis`");
    }

    #[test]
    fn test_commands_after_quit_are_ignored() {
        let responses = run_script(
            "{\"cmd\":\"quit\"}\n{\"cmd\":\"apply_suggestion\"}\n",
        );
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[1]["type"], "goodbye");
    }

    #[test]
    fn test_observation_waits_for_remote_calls() {
        let responses = run_script(
            "{\"cmd\":\"predict_capacity\"}\n{\"cmd\":\"apply_suggestion\"}\n",
        );
        let predicted = &responses[1]["observation"];
        assert_eq!(predicted["latest_prediction"]["beds"], 40);
        assert_eq!(predicted["requests_in_flight"], 0);

        let applied = &responses[2]["observation"];
        assert_eq!(applied["capacity"]["beds"], 55);
        assert_eq!(applied["capacity"]["staff"], 22);
    }
}
