//! Properties of the adapter policy that must hold for every input.
//!
//! Run: cargo test -p shim --test unsupported_proptest

// Test files legitimately use expect() for readable assertions.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use hal::mocks::{MockDevicesFactory, MockStreamIn, MockStreamOut, MOCK_CAPTURE_BYTE};
use hal::{
    AudioConfig, AudioConfigBase, AudioFormat, AudioSource, ChannelMask, DeviceType, HalError,
    InputFlags, IoHandle, OutputFlags,
};
use proptest::prelude::*;
use shim::{AudioStreamIn, AudioStreamOut, HalModule};

fn streams() -> (Arc<MockStreamOut>, AudioStreamOut, Arc<MockStreamIn>, AudioStreamIn) {
    let factory = Arc::new(MockDevicesFactory::new());
    let adev = HalModule::new(factory.clone()).open("audio_hw_if").unwrap();
    let mut config = AudioConfig::default();
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
    let mock = factory.device();
    (mock.last_output().unwrap(), out, mock.last_input().unwrap(), input)
}

fn any_error() -> impl Strategy<Value = HalError> {
    prop_oneof![
        Just(HalError::NoMemory),
        Just(HalError::InvalidArgument),
        Just(HalError::NoInit),
        Just(HalError::WouldBlock),
        Just(HalError::TimedOut),
        Just(HalError::DeadObject),
        (-4095i32..=-1).prop_map(HalError::Errno),
    ]
}

proptest! {
    /// Rate, format and channel setters never reach the backend.
    #[test]
    fn setters_are_not_implemented(rate in any::<u32>(), format in any::<u32>(), mask in any::<u32>()) {
        let (out_mock, out, in_mock, input) = streams();
        let out_calls = out_mock.calls();
        let in_calls = in_mock.calls();

        prop_assert_eq!(out.set_sample_rate(rate), Err(HalError::NotImplemented));
        prop_assert_eq!(out.set_format(AudioFormat(format)), Err(HalError::NotImplemented));
        prop_assert_eq!(out.set_channel_mask(ChannelMask(mask)), Err(HalError::NotImplemented));
        prop_assert_eq!(input.set_sample_rate(rate), Err(HalError::NotImplemented));
        prop_assert_eq!(input.set_format(AudioFormat(format)), Err(HalError::NotImplemented));
        prop_assert_eq!(input.set_channel_mask(ChannelMask(mask)), Err(HalError::NotImplemented));

        prop_assert_eq!(out_mock.calls(), out_calls);
        prop_assert_eq!(in_mock.calls(), in_calls);
    }

    /// A backend accepting `k <= n` bytes makes `write` return exactly `k`.
    #[test]
    fn write_returns_what_backend_accepts(len in 0usize..4096, limit in 0usize..4096) {
        let (mock, out, _, _) = streams();
        mock.set_io_limit(Some(limit));
        let buffer = vec![0u8; len];
        prop_assert_eq!(out.write(&buffer), Ok(len.min(limit)));
    }

    /// `read` reports exactly the bytes the backend filled.
    #[test]
    fn read_returns_what_backend_fills(len in 0usize..4096, limit in 0usize..4096) {
        let (_, _, mock, input) = streams();
        mock.set_io_limit(Some(limit));
        let mut buffer = vec![0u8; len];
        let filled = input.read(&mut buffer).unwrap();
        prop_assert_eq!(filled, len.min(limit));
        prop_assert!(buffer[..filled].iter().all(|b| *b == MOCK_CAPTURE_BYTE));
    }

    /// A failing backend yields its status, never a byte count.
    #[test]
    fn transfer_failure_keeps_status(err in any_error(), len in 1usize..1024) {
        let (out_mock, out, in_mock, input) = streams();
        out_mock.set_failure(Some(err));
        in_mock.set_failure(Some(err));
        prop_assert_eq!(out.write(&vec![0u8; len]), Err(err));
        prop_assert_eq!(input.read(&mut vec![0u8; len]), Err(err));
    }

    /// Whatever the caller asks for, the backend's selection is what it sees.
    #[test]
    fn open_reports_backend_selection(
        requested_rate in any::<u32>(),
        requested_mask in any::<u32>(),
        selected_rate in 1u32..192_000,
    ) {
        let factory = Arc::new(MockDevicesFactory::new());
        let adev = HalModule::new(factory.clone()).open("audio_hw_if").unwrap();
        let selected = AudioConfigBase {
            sample_rate: selected_rate,
            channel_mask: ChannelMask::OUT_STEREO,
            format: AudioFormat::PCM_FLOAT,
        };
        factory.device().set_stream_config(selected);
        let mut config = AudioConfig {
            sample_rate: requested_rate,
            channel_mask: ChannelMask(requested_mask),
            ..AudioConfig::default()
        };
        adev.open_output_stream(IoHandle(1), DeviceType::OUT_SPEAKER, OutputFlags::NONE, &mut config, "")
            .unwrap();
        prop_assert_eq!(config.base(), selected);
    }
}
