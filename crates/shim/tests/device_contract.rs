//! Device record forwarding against the mock backend.
//!
//! Run: cargo test -p shim --test device_contract

// Test files legitimately use expect() for readable assertions.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use hal::mocks::{MockDevice, MockDevicesFactory, MOCK_STREAM_CONFIG};
use hal::{
    AudioConfig, AudioConfigBase, AudioFormat, AudioMode, AudioSource, ChannelMask, DeviceType,
    HalError, InputFlags, IoHandle, OutputFlags, PatchHandle, PortConfig, PortRole,
};
use shim::{AudioHwDevice, HalModule, ShimConfig};

fn open() -> (Arc<MockDevice>, AudioHwDevice) {
    let factory = Arc::new(MockDevicesFactory::new());
    let module = HalModule::new(factory.clone());
    let adev = module.open("audio_hw_if").expect("mock factory opens");
    (factory.device(), adev)
}

fn requested() -> AudioConfig {
    AudioConfig {
        sample_rate: 8_000,
        channel_mask: ChannelMask::OUT_MONO,
        format: AudioFormat::PCM_FLOAT,
        frame_count: 256,
        ..AudioConfig::default()
    }
}

// ── Module open ──────────────────────────────────────────────────────────────

#[test]
fn open_uses_primary_module() {
    let factory = Arc::new(MockDevicesFactory::new());
    HalModule::new(factory.clone()).open("audio_hw_if").unwrap();
    assert_eq!(factory.opened_modules(), vec!["primary"]);
}

#[test]
fn open_uses_configured_module() {
    let factory = Arc::new(MockDevicesFactory::new());
    let config = ShimConfig {
        primary_module: "usb".to_owned(),
        ..ShimConfig::default()
    };
    let module = HalModule::with_config(factory.clone(), config);
    assert_eq!(module.config().primary_module, "usb");
    assert_eq!(module.config().log_filter, ShimConfig::default().log_filter);
    module.open("audio_hw_if").unwrap();
    assert_eq!(factory.opened_modules(), vec!["usb"]);
}

#[test]
fn wrong_interface_never_reaches_factory() {
    let factory = Arc::new(MockDevicesFactory::new());
    let module = HalModule::new(factory.clone());
    for name in ["", "audio", "audio_hw_if ", "AUDIO_HW_IF"] {
        assert_eq!(module.open(name).err(), Some(HalError::InvalidArgument), "{name:?}");
    }
    assert!(factory.opened_modules().is_empty());
}

#[test]
fn factory_failure_fails_open() {
    let factory = Arc::new(MockDevicesFactory::new());
    factory.fail_open(HalError::NoInit);
    let result = HalModule::new(factory).open("audio_hw_if");
    assert_eq!(result.err(), Some(HalError::NoInit));
}

// ── Device forwarding ────────────────────────────────────────────────────────

#[test]
fn record_wraps_the_factory_device() {
    let (mock, adev) = open();
    let wrapped = Arc::as_ptr(adev.hal()).cast::<()>();
    assert_eq!(wrapped, Arc::as_ptr(&mock).cast::<()>());
}

#[test]
fn volume_mode_and_mute_are_forwarded() {
    let (mock, adev) = open();
    adev.init_check().unwrap();
    adev.set_voice_volume(0.25).unwrap();
    adev.set_master_volume(0.5).unwrap();
    assert_eq!(adev.master_volume().unwrap(), 0.5);
    adev.set_master_mute(true).unwrap();
    assert!(adev.master_mute().unwrap());
    adev.set_mic_mute(true).unwrap();
    assert!(adev.mic_mute().unwrap());
    adev.set_mode(AudioMode::IN_COMMUNICATION).unwrap();

    assert_eq!(mock.voice_volume(), 0.25);
    assert_eq!(mock.mode(), AudioMode::IN_COMMUNICATION);
    assert_eq!(
        mock.calls(),
        vec![
            "init_check",
            "set_voice_volume",
            "set_master_volume",
            "master_volume",
            "set_master_mute",
            "master_mute",
            "set_mic_mute",
            "mic_mute",
            "set_mode",
        ]
    );
}

#[test]
fn backend_status_is_passed_through() {
    let (mock, adev) = open();
    mock.set_failure(Some(HalError::DeadObject));
    assert_eq!(adev.init_check(), Err(HalError::DeadObject));
    assert_eq!(adev.set_master_volume(1.0), Err(HalError::DeadObject));
    assert_eq!(adev.master_mute(), Err(HalError::DeadObject));
    assert_eq!(adev.parameters("routing"), Err(HalError::DeadObject));
}

#[test]
fn parameters_are_forwarded_verbatim() {
    let (mock, adev) = open();
    mock.set_parameters_reply("bt_headset_nrec=on");
    adev.set_parameters("screen_state=off;rotation=90").unwrap();
    assert_eq!(mock.last_kv_pairs().as_deref(), Some("screen_state=off;rotation=90"));
    assert_eq!(adev.parameters("bt_headset_nrec").unwrap(), "bt_headset_nrec=on");
    assert_eq!(mock.last_keys().as_deref(), Some("bt_headset_nrec"));
}

#[test]
fn input_buffer_size_defaults_to_zero_on_failure() {
    let (mock, adev) = open();
    mock.set_input_buffer_size(1920);
    assert_eq!(adev.input_buffer_size(&requested()), 1920);
    mock.set_failure(Some(HalError::InvalidArgument));
    assert_eq!(adev.input_buffer_size(&requested()), 0);
}

#[test]
fn dump_forwards_without_arguments() {
    let (mock, adev) = open();
    let mut sink = Vec::new();
    adev.dump(&mut sink).unwrap();
    assert_eq!(sink, b"mock device\n");
    assert!(mock.dump_args().is_empty());
}

#[test]
fn patches_are_forwarded() {
    let (mock, adev) = open();
    let source = PortConfig {
        role: PortRole::Source,
        ..PortConfig::default()
    };
    let sink = PortConfig {
        role: PortRole::Sink,
        ..PortConfig::default()
    };
    let handle = adev
        .create_audio_patch(&[source.clone()], &[sink.clone()], PatchHandle::NONE)
        .unwrap();
    assert_eq!(handle, PatchHandle(7));
    let (sources, sinks, requested) = mock.last_patch().unwrap();
    assert_eq!(sources, vec![source]);
    assert_eq!(sinks, vec![sink]);
    assert_eq!(requested, PatchHandle::NONE);

    adev.release_audio_patch(handle).unwrap();
    assert_eq!(mock.released_patches(), vec![PatchHandle(7)]);
}

// ── Stream negotiation ───────────────────────────────────────────────────────

#[test]
fn output_open_reports_backend_selection() {
    let (mock, adev) = open();
    let mut config = requested();
    let out = adev
        .open_output_stream(
            IoHandle(13),
            DeviceType::OUT_SPEAKER,
            OutputFlags::PRIMARY,
            &mut config,
            "bus0_media_out",
        )
        .unwrap();
    assert_eq!(config.base(), MOCK_STREAM_CONFIG);
    assert_eq!(config.frame_count, 256);
    assert_eq!(mock.last_open_request().unwrap().base(), requested().base());
    assert_eq!(mock.last_open_address().as_deref(), Some("bus0_media_out"));
    assert_eq!(out.sample_rate(), MOCK_STREAM_CONFIG.sample_rate);
}

#[test]
fn input_open_reports_backend_selection() {
    let (mock, adev) = open();
    let selected = AudioConfigBase {
        sample_rate: 16_000,
        channel_mask: ChannelMask::IN_MONO,
        format: AudioFormat::PCM_16_BIT,
    };
    mock.set_stream_config(selected);
    let mut config = requested();
    let input = adev
        .open_input_stream(
            IoHandle(21),
            DeviceType::IN_BUILTIN_MIC,
            &mut config,
            InputFlags::NONE,
            "",
            AudioSource::MIC,
        )
        .unwrap();
    assert_eq!(config.base(), selected);
    assert_eq!(input.channel_mask(), ChannelMask::IN_MONO);
}

#[test]
fn output_open_failure_is_invalid_argument() {
    let (mock, adev) = open();
    mock.set_failure(Some(HalError::NoInit));
    let mut config = requested();
    let result = adev.open_output_stream(
        IoHandle(1),
        DeviceType::OUT_SPEAKER,
        OutputFlags::NONE,
        &mut config,
        "",
    );
    assert_eq!(result.err(), Some(HalError::InvalidArgument));
}

#[test]
fn input_open_failure_keeps_backend_status() {
    let (mock, adev) = open();
    mock.set_failure(Some(HalError::NoInit));
    let mut config = requested();
    let result = adev.open_input_stream(
        IoHandle(1),
        DeviceType::IN_BUILTIN_MIC,
        &mut config,
        InputFlags::NONE,
        "",
        AudioSource::MIC,
    );
    assert_eq!(result.err(), Some(HalError::NoInit));
}

#[test]
fn close_releases_backend_stream_once() {
    let (mock, adev) = open();
    let mut config = requested();
    let out = adev
        .open_output_stream(IoHandle(1), DeviceType::OUT_SPEAKER, OutputFlags::NONE, &mut config, "")
        .unwrap();
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
    assert_eq!(mock.outputs_released(), 0);
    adev.close_output_stream(out);
    adev.close_input_stream(input);
    assert_eq!(mock.outputs_released(), 1);
    assert_eq!(mock.inputs_released(), 1);
    assert!(mock.last_output().is_none());
}
