//! Output and input stream records against the mock backend.
//!
//! Run: cargo test -p shim --test stream_contract

// Test files legitimately use expect() for readable assertions.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use hal::mocks::{MockDevice, MockDevicesFactory, MockStreamIn, MockStreamOut, MOCK_CAPTURE_BYTE};
use hal::{
    AudioConfig, AudioConfigBase, AudioSource, ChannelMask, DeviceType, EffectHandle, HalError,
    InputFlags, IoHandle, OutputFlags, PresentationPosition,
};
use shim::{AudioHwDevice, AudioStreamIn, AudioStreamOut, HalModule};

fn device() -> (Arc<MockDevice>, AudioHwDevice) {
    let factory = Arc::new(MockDevicesFactory::new());
    let adev = HalModule::new(factory.clone()).open("audio_hw_if").unwrap();
    (factory.device(), adev)
}

fn output() -> (Arc<MockStreamOut>, AudioStreamOut) {
    let (mock, adev) = device();
    let mut config = AudioConfig::default();
    let out = adev
        .open_output_stream(IoHandle(1), DeviceType::OUT_SPEAKER, OutputFlags::NONE, &mut config, "")
        .unwrap();
    (mock.last_output().unwrap(), out)
}

fn input() -> (Arc<MockStreamIn>, AudioStreamIn) {
    let (mock, adev) = device();
    let mut config = AudioConfig::default();
    let input = adev
        .open_input_stream(
            IoHandle(2),
            DeviceType::IN_BUILTIN_MIC,
            &mut config,
            InputFlags::NONE,
            "",
            AudioSource::MIC,
        )
        .unwrap();
    (mock.last_input().unwrap(), input)
}

// ── Output ───────────────────────────────────────────────────────────────────

#[test]
fn output_getters_report_backend_values() {
    let (mock, out) = output();
    mock.set_buffer_size(3840);
    mock.set_latency(75);
    assert_eq!(out.sample_rate(), 44_100);
    assert_eq!(out.channel_mask(), ChannelMask::OUT_STEREO);
    assert_eq!(out.buffer_size(), 3840);
    assert_eq!(out.latency(), 75);
}

#[test]
fn records_wrap_the_opened_backend_streams() {
    let (out_mock, out) = output();
    assert_eq!(Arc::as_ptr(out.hal()).cast::<()>(), Arc::as_ptr(&out_mock).cast::<()>());
    let (in_mock, input) = input();
    assert_eq!(Arc::as_ptr(input.hal()).cast::<()>(), Arc::as_ptr(&in_mock).cast::<()>());
}

#[test]
fn output_getters_default_to_zero_on_failure() {
    let (mock, out) = output();
    mock.set_failure(Some(HalError::DeadObject));
    assert_eq!(out.sample_rate(), 0);
    assert_eq!(out.channel_mask(), ChannelMask::NONE);
    assert_eq!(out.buffer_size(), 0);
    assert_eq!(out.latency(), 0);
    assert_eq!(out.properties(), AudioConfigBase::default());
}

#[test]
fn output_control_is_forwarded() {
    let (mock, out) = output();
    out.standby().unwrap();
    out.set_volume(0.5, 0.75).unwrap();
    out.set_parameters("routing=2").unwrap();
    mock.set_parameters_reply("routing=2");
    assert_eq!(out.parameters("routing").unwrap(), "routing=2");
    assert_eq!(mock.volume(), (0.5, 0.75));
    assert_eq!(mock.last_kv_pairs().as_deref(), Some("routing=2"));
    assert_eq!(mock.call_count("standby"), 1);
}

#[test]
fn write_returns_accepted_bytes() {
    let (mock, out) = output();
    assert_eq!(out.write(&[0u8; 512]).unwrap(), 512);
    mock.set_io_limit(Some(100));
    assert_eq!(out.write(&[0u8; 512]).unwrap(), 100);
    assert_eq!(mock.bytes_transferred(), 612);
}

#[test]
fn write_failure_is_never_a_partial_count() {
    let (mock, out) = output();
    mock.set_failure(Some(HalError::WouldBlock));
    assert_eq!(out.write(&[0u8; 64]), Err(HalError::WouldBlock));
    assert_eq!(mock.bytes_transferred(), 0);
}

#[test]
fn positions_are_forwarded() {
    let (mock, out) = output();
    mock.set_render_position(480);
    mock.set_next_write_timestamp(1_500);
    let position = PresentationPosition {
        frames: 96_000,
        timestamp: Duration::new(12, 500),
    };
    mock.set_presentation_position(position);
    assert_eq!(out.render_position().unwrap(), 480);
    assert_eq!(out.next_write_timestamp().unwrap(), 1_500);
    assert_eq!(out.presentation_position().unwrap(), position);
}

#[test]
fn output_dump_reaches_sink() {
    let (_mock, out) = output();
    let mut sink = Vec::new();
    out.dump(&mut sink).unwrap();
    assert_eq!(sink, b"mock MockStreamOut\n");
}

#[test]
fn effects_never_reach_backend() {
    let (mock, out) = output();
    let before = mock.calls();
    assert_eq!(out.add_audio_effect(EffectHandle(1)), Err(HalError::Unsupported));
    assert_eq!(out.remove_audio_effect(EffectHandle(1)), Err(HalError::Unsupported));
    assert_eq!(mock.calls(), before);
}

// ── Input ────────────────────────────────────────────────────────────────────

#[test]
fn read_fills_accepted_bytes() {
    let (mock, input) = input();
    let mut buffer = [0u8; 256];
    mock.set_io_limit(Some(64));
    assert_eq!(input.read(&mut buffer).unwrap(), 64);
    assert!(buffer[..64].iter().all(|b| *b == MOCK_CAPTURE_BYTE));
    assert!(buffer[64..].iter().all(|b| *b == 0));
}

#[test]
fn read_failure_is_never_a_partial_count() {
    let (mock, input) = input();
    mock.set_failure(Some(HalError::TimedOut));
    let mut buffer = [0u8; 32];
    assert_eq!(input.read(&mut buffer), Err(HalError::TimedOut));
}

#[test]
fn input_gain_and_overruns() {
    let (mock, input) = input();
    input.set_gain(0.3).unwrap();
    assert_eq!(mock.gain(), 0.3);
    mock.set_frames_lost(17);
    assert_eq!(input.input_frames_lost(), 17);
    mock.set_failure(Some(HalError::NoInit));
    assert_eq!(input.input_frames_lost(), 0);
    assert_eq!(input.buffer_size(), 0);
}

#[test]
fn input_setters_are_not_implemented() {
    let (mock, input) = input();
    // open negotiates through the property query; nothing after that
    assert_eq!(mock.calls(), vec!["audio_properties"]);
    assert_eq!(input.set_sample_rate(8_000), Err(HalError::NotImplemented));
    assert_eq!(input.set_channel_mask(ChannelMask::IN_STEREO), Err(HalError::NotImplemented));
    assert_eq!(mock.calls(), vec!["audio_properties"]);
}

#[test]
fn dropping_record_releases_backend_stream() {
    let (mock, adev) = device();
    let mut config = AudioConfig::default();
    let out = adev
        .open_output_stream(IoHandle(1), DeviceType::OUT_SPEAKER, OutputFlags::NONE, &mut config, "")
        .unwrap();
    drop(out);
    assert_eq!(mock.outputs_released(), 1);
}
