//! CPAL device layer: one input stream feeding capture, one output stream pulling
//! playback.

use crate::context::PipelineContext;
use crate::pipeline::Pipeline;
use crate::{CaptureAdapter, Error, PlaybackAdapter, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, SupportedBufferSize};
use std::sync::Arc;

/// Hardware buffer size requested when the device allows it.
pub const PREFERRED_BUFFER_FRAMES: u32 = 4096;

/// Device selection. Indices refer to [`list_input_devices`] / [`list_output_devices`];
/// `None` picks the host default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub input_device: Option<usize>,
    pub output_device: Option<usize>,
    /// Requested frames per hardware buffer. Falls back to the device default when
    /// outside the supported range.
    pub buffer_frames: Option<u32>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            input_device: None,
            output_device: None,
            buffer_frames: Some(PREFERRED_BUFFER_FRAMES),
        }
    }
}

/// Wrapper to hold `cpal::Stream` in a `Send` context.
///
/// # Safety
/// `cpal::Stream` is `!Send` due to platform internals. This is safe because
/// `AudioDevices` is only driven from the control thread, behind a `Mutex` in the
/// engine.
struct StreamHandle(cpal::Stream);

unsafe impl Send for StreamHandle {}

/// Input and output device pair.
///
/// Devices are held by index and resolved again when streams are built.
pub struct AudioDevices {
    input_index: Option<usize>,
    output_index: Option<usize>,
    input_config: cpal::SupportedStreamConfig,
    output_config: cpal::SupportedStreamConfig,
    buffer_frames: Option<u32>,
    streams: Option<(StreamHandle, StreamHandle)>,
}

impl AudioDevices {
    /// Select devices and read their default configurations. No stream is built.
    pub fn open(config: &DeviceConfig) -> Result<Self> {
        let input = get_input_device(config.input_device)?;
        let output = get_output_device(config.output_device)?;
        let input_config = input.default_input_config()?;
        let output_config = output.default_output_config()?;

        let (input_name, output_name) = (input.name()?, output.name()?);
        tracing::info!(
            input = %input_name,
            output = %output_name,
            input_rate = input_config.sample_rate().0,
            output_rate = output_config.sample_rate().0,
            "audio devices selected"
        );
        if input_config.sample_rate() != output_config.sample_rate() {
            tracing::warn!("input and output sample rates differ; no conversion is applied");
        }

        Ok(Self {
            input_index: config.input_device,
            output_index: config.output_device,
            input_config,
            output_config,
            buffer_frames: config.buffer_frames,
            streams: None,
        })
    }

    /// Output sample rate, for deriving `nyquist_hz`.
    pub fn sample_rate(&self) -> f64 {
        self.output_config.sample_rate().0 as f64
    }

    pub fn input_channels(&self) -> usize {
        self.input_config.channels() as usize
    }

    pub fn output_channels(&self) -> usize {
        self.output_config.channels() as usize
    }

    pub fn input_name(&self) -> Result<String> {
        Ok(get_input_device(self.input_index)?.name()?)
    }

    pub fn output_name(&self) -> Result<String> {
        Ok(get_output_device(self.output_index)?.name()?)
    }

    /// Build both streams against `pipeline` and start them.
    ///
    /// Claims the pipeline's capture adapter for as long as the streams live.
    pub fn play(&mut self, pipeline: &Pipeline) -> Result<()> {
        if let Some((input, output)) = &self.streams {
            input.0.play()?;
            output.0.play()?;
            return Ok(());
        }

        let input_device = get_input_device(self.input_index)?;
        let output_device = get_output_device(self.output_index)?;
        let capture = pipeline.capture_adapter()?;
        let playback = pipeline.playback_adapter();
        let context = pipeline.context_handle();

        let input_config = stream_config(&self.input_config, self.buffer_frames);
        let output_config = stream_config(&self.output_config, self.buffer_frames);
        let input_frames = callback_frames(&self.input_config, &input_config);
        let output_frames = callback_frames(&self.output_config, &output_config);

        let input = match self.input_config.sample_format() {
            SampleFormat::F32 => build_input_stream::<f32>(
                &input_device,
                &input_config,
                input_frames,
                capture,
                &context,
            )?,
            SampleFormat::I16 => build_input_stream::<i16>(
                &input_device,
                &input_config,
                input_frames,
                capture,
                &context,
            )?,
            SampleFormat::U16 => build_input_stream::<u16>(
                &input_device,
                &input_config,
                input_frames,
                capture,
                &context,
            )?,
            format => {
                return Err(Error::InvalidDevice(format!(
                    "Unsupported input sample format: {format:?}"
                )));
            }
        };
        let output = match self.output_config.sample_format() {
            SampleFormat::F32 => build_output_stream::<f32>(
                &output_device,
                &output_config,
                output_frames,
                playback,
                &context,
            )?,
            SampleFormat::I16 => build_output_stream::<i16>(
                &output_device,
                &output_config,
                output_frames,
                playback,
                &context,
            )?,
            SampleFormat::U16 => build_output_stream::<u16>(
                &output_device,
                &output_config,
                output_frames,
                playback,
                &context,
            )?,
            format => {
                return Err(Error::InvalidDevice(format!(
                    "Unsupported output sample format: {format:?}"
                )));
            }
        };

        input.play()?;
        output.play()?;
        tracing::debug!(
            input_buffer = ?input_config.buffer_size,
            output_buffer = ?output_config.buffer_size,
            "device streams playing"
        );
        self.streams = Some((StreamHandle(input), StreamHandle(output)));
        Ok(())
    }

    /// Pause both streams. They can be resumed with [`play`](Self::play).
    pub fn pause(&self) -> Result<()> {
        if let Some((input, output)) = &self.streams {
            input.0.pause()?;
            output.0.pause()?;
        }
        Ok(())
    }

    /// Drop both streams, releasing the capture claim.
    pub fn close(&mut self) {
        if self.streams.take().is_some() {
            tracing::debug!("device streams closed");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.streams.is_some()
    }
}

pub fn list_input_devices() -> Result<Vec<String>> {
    cpal::default_host()
        .input_devices()?
        .enumerate()
        .map(|(i, d)| Ok(format!("{i}: {}", d.name()?)))
        .collect()
}

pub fn list_output_devices() -> Result<Vec<String>> {
    cpal::default_host()
        .output_devices()?
        .enumerate()
        .map(|(i, d)| Ok(format!("{i}: {}", d.name()?)))
        .collect()
}

fn get_input_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();
    match index {
        Some(i) => {
            let devices: Vec<_> = host.input_devices()?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::InvalidDevice(format!(
                    "Input device index {i} out of range ({count} available)"
                ))
            })
        }
        None => host
            .default_input_device()
            .ok_or_else(|| Error::InvalidDevice("No input device available".into())),
    }
}

fn get_output_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();
    match index {
        Some(i) => {
            let devices: Vec<_> = host.output_devices()?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::InvalidDevice(format!(
                    "Output device index {i} out of range ({count} available)"
                ))
            })
        }
        None => host
            .default_output_device()
            .ok_or_else(|| Error::InvalidDevice("No output device available".into())),
    }
}

/// Scratch size used when the host picks the buffer and reports no range.
const FALLBACK_CALLBACK_FRAMES: u32 = 16_384;

fn stream_config(
    supported: &cpal::SupportedStreamConfig,
    buffer_frames: Option<u32>,
) -> cpal::StreamConfig {
    let mut config: cpal::StreamConfig = supported.config();
    if let Some(frames) = buffer_frames {
        match supported.buffer_size() {
            SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&frames) => {
                config.buffer_size = cpal::BufferSize::Fixed(frames);
            }
            _ => tracing::debug!(frames, "requested buffer size unsupported, using default"),
        }
    }
    config
}

/// Frames per callback chunk, fixed before the stream starts.
///
/// Callbacks larger than this are handled in chunks so the scratch buffers never
/// grow on the real-time thread.
fn callback_frames(
    supported: &cpal::SupportedStreamConfig,
    config: &cpal::StreamConfig,
) -> usize {
    let frames = match config.buffer_size {
        cpal::BufferSize::Fixed(frames) => frames,
        cpal::BufferSize::Default => match supported.buffer_size() {
            SupportedBufferSize::Range { max, .. } => (*max).min(FALLBACK_CALLBACK_FRAMES),
            SupportedBufferSize::Unknown => FALLBACK_CALLBACK_FRAMES,
        },
    };
    frames.max(1) as usize
}

/// Run a callback body, counting a panic as a stream error.
///
/// Returns `false` if the body panicked.
fn guarded(context: &PipelineContext, body: impl FnOnce()) -> bool {
    let ok = std::panic::catch_unwind(std::panic::AssertUnwindSafe(body)).is_ok();
    if !ok {
        context.metrics.record_stream_error();
    }
    ok
}

/// Copy channel 0 of `data` into `mono` one chunk at a time.
fn capture_chunks<T>(
    data: &[T],
    channels: usize,
    mono: &mut Vec<f32>,
    mut push: impl FnMut(&[f32]),
) where
    T: SizedSample,
    f32: FromSample<T>,
{
    let chunk_len = mono.capacity().max(1) * channels;
    for chunk in data.chunks(chunk_len) {
        mono.clear();
        mono.extend(chunk.chunks(channels).map(|frame| f32::from_sample(frame[0])));
        push(mono.as_slice());
    }
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    frames: usize,
    capture: CaptureAdapter,
    context: &Arc<PipelineContext>,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = (config.channels as usize).max(1);
    let mut mono = Vec::<f32>::with_capacity(frames);
    let callback_context = Arc::clone(context);
    let errors = Arc::clone(context);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            guarded(&callback_context, || {
                capture_chunks(data, channels, &mut mono, |block| {
                    capture.on_capture_block(block)
                });
            });
        },
        move |err| {
            errors.metrics.record_stream_error();
            tracing::error!("input stream error: {err}");
        },
        None,
    )?;

    Ok(stream)
}

fn build_output_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    frames: usize,
    playback: PlaybackAdapter,
    context: &Arc<PipelineContext>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = (config.channels as usize).max(1);
    let mut rendered = vec![0.0f32; frames * channels];
    let callback_context = Arc::clone(context);
    let errors = Arc::clone(context);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let ok = guarded(&callback_context, || {
                render_chunks(data, channels, &mut rendered, |buffer| {
                    playback.render_interleaved(buffer, channels)
                });
            });
            if !ok {
                output_silence(data);
            }
        },
        move |err| {
            errors.metrics.record_stream_error();
            tracing::error!("output stream error: {err}");
        },
        None,
    )?;

    Ok(stream)
}

/// Render into `rendered` one chunk at a time and convert into `data`.
fn render_chunks<T>(
    data: &mut [T],
    channels: usize,
    rendered: &mut [f32],
    mut render: impl FnMut(&mut [f32]),
) where
    T: SizedSample + FromSample<f32>,
{
    // Whole frames only, so channel alignment survives chunking
    let chunk_len = (rendered.len() / channels).max(1) * channels;
    for chunk in data.chunks_mut(chunk_len) {
        let buffer = &mut rendered[..chunk.len()];
        render(buffer);
        write_output(chunk, buffer);
    }
}

#[inline]
fn write_output<T: SizedSample + FromSample<f32>>(data: &mut [T], rendered: &[f32]) {
    for (out, &sample) in data.iter_mut().zip(rendered) {
        *out = T::from_sample(sample);
    }
}

/// Panic recovery.
#[inline]
fn output_silence<T: SizedSample + FromSample<f32>>(data: &mut [T]) {
    for sample in data.iter_mut() {
        *sample = T::from_sample(0.0);
    }
}
