//! Frame type and handler traits through which the host application supplies
//! and consumes audio.

use crate::constants::STEREO_FRAME_SIZE;
use crate::model::id::UserId;

/// One 20ms frame of raw PCM audio: 48kHz, signed 16-bit, two channels
/// interleaved left-first.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AudioFrame {
    /// Interleaved samples for both channels.
    pub samples: [i16; STEREO_FRAME_SIZE],
}

impl AudioFrame {
    /// A frame of pure silence.
    pub fn silence() -> Self {
        Self {
            samples: [0; STEREO_FRAME_SIZE],
        }
    }
}

impl Default for AudioFrame {
    fn default() -> Self {
        Self::silence()
    }
}

/// Source of outgoing audio, polled by the send loop once per frame interval.
///
/// Implementations must not block or do costly work in either method: taking
/// longer than the frame interval delays packet sends and audibly degrades
/// the stream.
pub trait AudioSendHandler: Send {
    /// Whether a frame can be supplied right now.
    ///
    /// Returning `false` for a frame interval ends the current speaking burst;
    /// returning `true` again opens a new one.
    fn can_provide(&mut self) -> bool;

    /// Called when a frame is due. `None` is treated the same as
    /// [`can_provide`] having returned `false`.
    ///
    /// [`can_provide`]: AudioSendHandler::can_provide
    fn provide_frame(&mut self) -> Option<AudioFrame>;
}

/// Consumer of incoming audio, invoked from the receive loop.
///
/// The same timing caution as for [`AudioSendHandler`] applies.
pub trait AudioReceiveHandler: Send {
    /// Whether combined audio should be delivered via [`on_combined_audio`].
    ///
    /// [`on_combined_audio`]: AudioReceiveHandler::on_combined_audio
    fn wants_combined(&mut self) -> bool;

    /// Whether per-user audio should be delivered via [`on_user_audio`].
    ///
    /// [`on_user_audio`]: AudioReceiveHandler::on_user_audio
    fn wants_per_user(&mut self) -> bool;

    /// Fired every frame interval with the sum of all currently active
    /// speakers, or silence if there are none. Suited to recording a
    /// continuous timeline of the call.
    fn on_combined_audio(&mut self, mixed: &AudioFrame);

    /// Fired only when `user_id` has audio in the current frame interval.
    fn on_user_audio(&mut self, user_id: UserId, frame: &AudioFrame);

    /// Fired when the server reports that a participant started or stopped
    /// speaking.
    ///
    /// This is also the only way the server ties media streams to users, so
    /// per-user audio for a participant can only be delivered after their
    /// first such notification.
    fn on_user_speaking_changed(&mut self, user_id: UserId, speaking: bool);
}
