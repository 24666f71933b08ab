//! Null backend behaviour through the public trait objects only.
//!
//! Run: cargo test -p hal --test null_backend

// Test files legitimately use expect() for readable assertions.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::thread;

use hal::null::{NullDevicesFactory, DEFAULT_SAMPLE_RATE};
use hal::{
    status_of, AudioConfig, AudioFormat, AudioMode, AudioSource, ChannelMask, DeviceHal, DeviceType,
    DevicesFactoryHal, HalError, InputFlags, IoHandle, OutputFlags, PatchHandle, PortConfig,
    PortConfigExt, PortRole,
};

fn open_primary() -> Arc<dyn DeviceHal> {
    NullDevicesFactory::new()
        .open_device("primary")
        .expect("null factory opens any named module")
}

#[test]
fn device_state_is_remembered() {
    let dev = open_primary();
    dev.init_check().unwrap();
    dev.set_master_mute(true).unwrap();
    dev.set_mic_mute(true).unwrap();
    dev.set_mode(AudioMode::IN_CALL).unwrap();
    assert!(dev.master_mute().unwrap());
    assert!(dev.mic_mute().unwrap());
}

#[test]
fn invalid_mode_is_rejected() {
    let dev = open_primary();
    assert_eq!(dev.set_mode(AudioMode::INVALID), Err(HalError::InvalidArgument));
    assert_eq!(status_of(dev.set_mode(AudioMode::INVALID)), -libc::EINVAL);
    // CURRENT means "keep"; accepted
    dev.set_mode(AudioMode::CURRENT).unwrap();
}

#[test]
fn input_buffer_size_is_one_period() {
    let dev = open_primary();
    let config = AudioConfig {
        sample_rate: 16_000,
        channel_mask: ChannelMask::IN_MONO,
        format: AudioFormat::PCM_16_BIT,
        ..AudioConfig::default()
    };
    // 20 ms at 16 kHz mono 16-bit
    assert_eq!(dev.input_buffer_size(&config).unwrap(), 320 * 2);
}

#[test]
fn requested_frame_count_sizes_the_buffer() {
    let dev = open_primary();
    let mut config = AudioConfig {
        sample_rate: 44_100,
        channel_mask: ChannelMask::OUT_STEREO,
        format: AudioFormat::PCM_FLOAT,
        frame_count: 256,
        ..AudioConfig::default()
    };
    let out = dev
        .open_output_stream(IoHandle(1), DeviceType::OUT_SPEAKER, OutputFlags::FAST, &mut config, "")
        .unwrap();
    assert_eq!(out.buffer_size().unwrap(), 256 * 8);
    assert_eq!(out.audio_properties().unwrap().sample_rate, 44_100);
}

#[test]
fn input_defaults_to_mono() {
    let dev = open_primary();
    let mut config = AudioConfig::default();
    let input = dev
        .open_input_stream(
            IoHandle(9),
            DeviceType::IN_BUILTIN_MIC,
            &mut config,
            InputFlags::NONE,
            "",
            AudioSource::VOICE_COMMUNICATION,
        )
        .unwrap();
    assert_eq!(config.sample_rate, DEFAULT_SAMPLE_RATE);
    assert_eq!(config.channel_mask, ChannelMask::IN_MONO);
    assert_eq!(input.input_frames_lost().unwrap(), 0);
    assert_eq!(input.set_gain(2.0), Err(HalError::InvalidArgument));
}

#[test]
fn presentation_timestamp_is_monotonic() {
    let dev = open_primary();
    let mut config = AudioConfig::default();
    let out = dev
        .open_output_stream(IoHandle(1), DeviceType::OUT_SPEAKER, OutputFlags::NONE, &mut config, "")
        .unwrap();
    let first = out.presentation_position().unwrap();
    out.write(&[0u8; 64]).unwrap();
    let second = out.presentation_position().unwrap();
    assert!(second.timestamp >= first.timestamp);
    assert_eq!(second.frames, 16);
    assert_eq!(out.next_write_timestamp(), Err(HalError::InvalidOperation));
}

#[test]
fn patch_with_no_sinks_is_rejected() {
    let dev = open_primary();
    let source = PortConfig {
        role: PortRole::Source,
        ext: PortConfigExt::Device {
            hw_module: hal::ModuleHandle(1),
            device_type: DeviceType::IN_BUILTIN_MIC,
            address: String::from("bottom"),
        },
        ..PortConfig::default()
    };
    assert_eq!(
        dev.create_audio_patch(&[source], &[], PatchHandle::NONE),
        Err(HalError::InvalidArgument)
    );
}

#[test]
fn streams_are_usable_from_other_threads() {
    let dev = open_primary();
    let mut config = AudioConfig::default();
    let out = dev
        .open_output_stream(IoHandle(1), DeviceType::OUT_SPEAKER, OutputFlags::NONE, &mut config, "")
        .unwrap();
    let writers: Vec<_> = (0..4)
        .map(|_| {
            let out = Arc::clone(&out);
            thread::spawn(move || out.write(&[0u8; 400]).unwrap())
        })
        .collect();
    for writer in writers {
        assert_eq!(writer.join().unwrap(), 400);
    }
    assert_eq!(out.presentation_position().unwrap().frames, 400);
}
