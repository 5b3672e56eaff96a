//! Integration tests for the planning engine using the `TestSession` harness.
//!
//! Each test spins up a headless Bevy App with `EnginePlugin` and a scripted
//! backend, sends actions, lets the background calls land and checks the
//! resulting session state.

mod capacity_flow_tests;
