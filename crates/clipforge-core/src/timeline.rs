use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::EngineError,
    model::{AudioTrack, TimelineProperties, VideoClip},
};

/// Aggregate root for a project: every clip and audio track lives here, and
/// every structural edit is validated here before it commits. Clips are kept
/// sorted by (track index, start position) so overlap checks and duration
/// computation scan a single track run instead of the whole clip set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Timeline {
    pub properties: TimelineProperties,
    clips: Vec<VideoClip>,
    audio_tracks: Vec<AudioTrack>,
    #[serde(skip)]
    cursor_ms: u64,
    #[serde(skip)]
    selected_clip: Option<Uuid>,
    #[serde(skip)]
    dirty: bool,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(TimelineProperties::default())
    }
}

impl Timeline {
    #[must_use]
    pub fn new(properties: TimelineProperties) -> Self {
        Self {
            properties,
            clips: Vec::new(),
            audio_tracks: Vec::new(),
            cursor_ms: 0,
            selected_clip: None,
            dirty: false,
        }
    }

    // ===== Clips =====

    /// Inserts a clip after checking id uniqueness, trim bounds, and that the
    /// placement does not overlap any clip on the same track.
    pub fn add_clip(&mut self, clip: VideoClip) -> Result<(), EngineError> {
        if self.clips.iter().any(|existing| existing.id == clip.id) {
            return Err(EngineError::InvalidRange(format!(
                "clip id already present: {}",
                clip.id
            )));
        }
        if !clip.trim_is_valid() {
            return Err(EngineError::InvalidRange(format!(
                "trim range {}..{} outside source length {}",
                clip.trim_start_ms, clip.trim_end_ms, clip.source.duration_ms
            )));
        }
        if let Some(other) =
            self.span_conflict(clip.track_index, clip.start_ms, clip.end_ms(), None)
        {
            return Err(EngineError::Overlap {
                clip: clip.id,
                other: other.id,
                track: clip.track_index,
            });
        }

        self.clips.push(clip);
        self.sort_clips();
        self.mark_dirty();
        Ok(())
    }

    pub fn remove_clip(&mut self, clip_id: Uuid) -> Result<VideoClip, EngineError> {
        let index = self
            .clips
            .iter()
            .position(|clip| clip.id == clip_id)
            .ok_or(EngineError::ClipNotFound(clip_id))?;
        let removed = self.clips.remove(index);
        if self.selected_clip == Some(clip_id) {
            self.selected_clip = None;
        }
        self.mark_dirty();
        Ok(removed)
    }

    /// Re-validates the new placement against every other clip before
    /// committing; a rejected move leaves the timeline untouched.
    pub fn move_clip(
        &mut self,
        clip_id: Uuid,
        new_start_ms: u64,
        new_track: u32,
    ) -> Result<(), EngineError> {
        let duration = self
            .clip(clip_id)
            .ok_or(EngineError::ClipNotFound(clip_id))?
            .duration_ms();
        if let Some(other) = self.span_conflict(
            new_track,
            new_start_ms,
            new_start_ms.saturating_add(duration),
            Some(clip_id),
        ) {
            return Err(EngineError::Overlap {
                clip: clip_id,
                other: other.id,
                track: new_track,
            });
        }

        let clip = self.clip_mut_internal(clip_id)?;
        clip.start_ms = new_start_ms;
        clip.track_index = new_track;
        clip.touch();
        self.sort_clips();
        self.mark_dirty();
        Ok(())
    }

    /// New trim bounds must satisfy `start < end <= source length`, and the
    /// resulting span must still fit between its track neighbours.
    pub fn trim_clip(
        &mut self,
        clip_id: Uuid,
        trim_start_ms: u64,
        trim_end_ms: u64,
    ) -> Result<(), EngineError> {
        let (track, start_ms, speed, source_len) = {
            let clip = self.clip(clip_id).ok_or(EngineError::ClipNotFound(clip_id))?;
            (
                clip.track_index,
                clip.start_ms,
                clip.speed,
                clip.source.duration_ms,
            )
        };
        if trim_start_ms >= trim_end_ms || trim_end_ms > source_len {
            return Err(EngineError::InvalidRange(format!(
                "trim range {trim_start_ms}..{trim_end_ms} outside source length {source_len}"
            )));
        }

        let new_duration =
            ((trim_end_ms - trim_start_ms) as f64 / f64::from(speed)).round() as u64;
        if let Some(other) = self.span_conflict(
            track,
            start_ms,
            start_ms.saturating_add(new_duration),
            Some(clip_id),
        ) {
            return Err(EngineError::Overlap {
                clip: clip_id,
                other: other.id,
                track,
            });
        }

        let clip = self.clip_mut_internal(clip_id)?;
        clip.trim_start_ms = trim_start_ms;
        clip.trim_end_ms = trim_end_ms;
        clip.touch();
        self.mark_dirty();
        Ok(())
    }

    /// A slower speed lengthens the clip, so the new span is re-validated
    /// against the track before the speed commits. Out-of-range speeds are
    /// rejected, never clamped, at this level.
    pub fn set_clip_speed(&mut self, clip_id: Uuid, speed: f32) -> Result<(), EngineError> {
        if !(crate::model::MIN_CLIP_SPEED..=crate::model::MAX_CLIP_SPEED).contains(&speed) {
            return Err(EngineError::InvalidRange(format!(
                "speed {speed} outside {}..{}",
                crate::model::MIN_CLIP_SPEED,
                crate::model::MAX_CLIP_SPEED
            )));
        }

        let (track, start_ms, trimmed) = {
            let clip = self.clip(clip_id).ok_or(EngineError::ClipNotFound(clip_id))?;
            (
                clip.track_index,
                clip.start_ms,
                clip.trim_end_ms.saturating_sub(clip.trim_start_ms),
            )
        };
        let new_duration = (trimmed as f64 / f64::from(speed)).round() as u64;
        if let Some(other) = self.span_conflict(
            track,
            start_ms,
            start_ms.saturating_add(new_duration),
            Some(clip_id),
        ) {
            return Err(EngineError::Overlap {
                clip: clip_id,
                other: other.id,
                track,
            });
        }

        self.clip_mut_internal(clip_id)?.set_speed(speed);
        self.mark_dirty();
        Ok(())
    }

    pub fn set_clip_volume(&mut self, clip_id: Uuid, volume: f32) -> Result<(), EngineError> {
        if !(crate::model::MIN_CLIP_VOLUME..=crate::model::MAX_CLIP_VOLUME).contains(&volume) {
            return Err(EngineError::InvalidRange(format!(
                "volume {volume} outside {}..{}",
                crate::model::MIN_CLIP_VOLUME,
                crate::model::MAX_CLIP_VOLUME
            )));
        }
        self.clip_mut_internal(clip_id)?.set_volume(volume);
        self.mark_dirty();
        Ok(())
    }

    pub fn rename_clip(&mut self, clip_id: Uuid, name: impl Into<String>) -> Result<(), EngineError> {
        let clip = self.clip_mut_internal(clip_id)?;
        clip.name = name.into();
        clip.touch();
        self.mark_dirty();
        Ok(())
    }

    /// Splits a clip at a timeline position strictly inside its span. The
    /// first half keeps the original effect chain; the second half gets an
    /// independent copy with fresh effect identities and correctly shifted
    /// trim bounds. Splitting exactly on either boundary is rejected, and a
    /// split whose rounded second half would collide with a track neighbour
    /// fails with `Overlap`, leaving the clip intact.
    pub fn split_clip(&mut self, clip_id: Uuid, at_ms: u64) -> Result<(Uuid, Uuid), EngineError> {
        let original = self
            .clips
            .iter()
            .find(|clip| clip.id == clip_id)
            .ok_or(EngineError::ClipNotFound(clip_id))?
            .clone();

        if at_ms <= original.start_ms || at_ms >= original.end_ms() {
            return Err(EngineError::InvalidRange(format!(
                "split point {at_ms} not strictly inside {}..{}",
                original.start_ms,
                original.end_ms()
            )));
        }

        let offset_ms = at_ms - original.start_ms;
        let source_cut =
            original.trim_start_ms + (offset_ms as f64 * f64::from(original.speed)).round() as u64;
        if source_cut <= original.trim_start_ms || source_cut >= original.trim_end_ms {
            return Err(EngineError::InvalidRange(format!(
                "split point {at_ms} maps outside the clip's source material"
            )));
        }

        // Each half's duration is rounded independently, so at fractional
        // speeds their sum can exceed the original duration by a millisecond.
        // The second half is anchored to the first half's rounded end and its
        // span re-validated against the track before anything commits.
        let first_duration = ((source_cut - original.trim_start_ms) as f64
            / f64::from(original.speed))
        .round() as u64;
        let second_start = original.start_ms.saturating_add(first_duration);
        let second_duration = ((original.trim_end_ms - source_cut) as f64
            / f64::from(original.speed))
        .round() as u64;
        let second_end = second_start.saturating_add(second_duration);
        if let Some(other) = self.span_conflict(
            original.track_index,
            second_start,
            second_end,
            Some(clip_id),
        ) {
            return Err(EngineError::Overlap {
                clip: clip_id,
                other: other.id,
                track: original.track_index,
            });
        }

        let mut second = original.clone();
        second.id = Uuid::new_v4();
        second.effects = original.effects.duplicate();
        second.trim_start_ms = source_cut;
        second.start_ms = second_start;
        second.created_at = chrono::Utc::now();
        second.touch();
        let second_id = second.id;

        let first = self.clip_mut_internal(clip_id)?;
        first.trim_end_ms = source_cut;
        first.touch();
        debug_assert_eq!(first.end_ms(), second.start_ms);

        self.clips.push(second);
        self.sort_clips();
        self.mark_dirty();
        Ok((clip_id, second_id))
    }

    #[must_use]
    pub fn clip(&self, clip_id: Uuid) -> Option<&VideoClip> {
        self.clips.iter().find(|clip| clip.id == clip_id)
    }

    pub(crate) fn clip_mut(&mut self, clip_id: Uuid) -> Result<&mut VideoClip, EngineError> {
        if self.clip(clip_id).is_none() {
            return Err(EngineError::ClipNotFound(clip_id));
        }
        self.mark_dirty();
        self.clip_mut_internal(clip_id)
    }

    fn clip_mut_internal(&mut self, clip_id: Uuid) -> Result<&mut VideoClip, EngineError> {
        self.clips
            .iter_mut()
            .find(|clip| clip.id == clip_id)
            .ok_or(EngineError::ClipNotFound(clip_id))
    }

    #[must_use]
    pub fn clips(&self) -> &[VideoClip] {
        &self.clips
    }

    #[must_use]
    pub fn clips_on_track(&self, track_index: u32) -> Vec<&VideoClip> {
        self.clips
            .iter()
            .filter(|clip| clip.track_index == track_index)
            .collect()
    }

    #[must_use]
    pub fn clips_at(&self, time_ms: u64) -> Vec<&VideoClip> {
        self.clips.iter().filter(|clip| clip.contains(time_ms)).collect()
    }

    #[must_use]
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    #[must_use]
    pub fn max_track_in_use(&self) -> u32 {
        self.clips.iter().map(|clip| clip.track_index).max().unwrap_or(0)
    }

    /// Derived, never cached: max over clips of `start + duration`.
    #[must_use]
    pub fn total_duration_ms(&self) -> u64 {
        self.clips.iter().map(VideoClip::end_ms).max().unwrap_or(0)
    }

    /// All overlapping pairs per track, for diagnostics. With the clip list
    /// sorted by (track, start) each clip only needs to look ahead until the
    /// next start clears its own end.
    #[must_use]
    pub fn detect_overlaps(&self) -> Vec<(Uuid, Uuid, u32)> {
        let mut pairs = Vec::new();
        for (index, clip) in self.clips.iter().enumerate() {
            for other in &self.clips[index + 1..] {
                if other.track_index != clip.track_index {
                    break;
                }
                if other.start_ms >= clip.end_ms() {
                    break;
                }
                pairs.push((clip.id, other.id, clip.track_index));
            }
        }
        pairs
    }

    fn span_conflict(
        &self,
        track: u32,
        start_ms: u64,
        end_ms: u64,
        exclude: Option<Uuid>,
    ) -> Option<&VideoClip> {
        self.clips.iter().find(|clip| {
            clip.track_index == track
                && Some(clip.id) != exclude
                && clip.start_ms < end_ms
                && start_ms < clip.end_ms()
        })
    }

    fn sort_clips(&mut self) {
        self.clips
            .sort_by_key(|clip| (clip.track_index, clip.start_ms));
    }

    // ===== Audio tracks =====

    pub fn add_audio_track(&mut self, track: AudioTrack) -> Uuid {
        let id = track.id;
        self.audio_tracks.push(track);
        self.mark_dirty();
        id
    }

    pub fn remove_audio_track(&mut self, track_id: Uuid) -> Result<AudioTrack, EngineError> {
        let index = self
            .audio_tracks
            .iter()
            .position(|track| track.id == track_id)
            .ok_or(EngineError::TrackNotFound(track_id))?;
        let removed = self.audio_tracks.remove(index);
        self.mark_dirty();
        Ok(removed)
    }

    #[must_use]
    pub fn audio_track(&self, track_id: Uuid) -> Option<&AudioTrack> {
        self.audio_tracks.iter().find(|track| track.id == track_id)
    }

    pub(crate) fn audio_track_mut(&mut self, track_id: Uuid) -> Result<&mut AudioTrack, EngineError> {
        if self.audio_track(track_id).is_none() {
            return Err(EngineError::TrackNotFound(track_id));
        }
        self.mark_dirty();
        self.audio_tracks
            .iter_mut()
            .find(|track| track.id == track_id)
            .ok_or(EngineError::TrackNotFound(track_id))
    }

    #[must_use]
    pub fn audio_tracks(&self) -> &[AudioTrack] {
        &self.audio_tracks
    }

    #[must_use]
    pub fn any_solo(&self) -> bool {
        self.audio_tracks.iter().any(|track| track.solo)
    }

    /// Solo semantics are derived, not stored: when any track is solo, every
    /// non-solo track is treated as muted for mix purposes.
    #[must_use]
    pub fn is_track_audible(&self, track_id: Uuid) -> Option<bool> {
        let track = self.audio_track(track_id)?;
        if !track.enabled || track.muted {
            return Some(false);
        }
        if self.any_solo() && !track.solo {
            return Some(false);
        }
        Some(true)
    }

    // ===== Cursor & selection =====

    #[must_use]
    pub fn cursor_ms(&self) -> u64 {
        self.cursor_ms
    }

    /// Clamps to `[0, total duration]`.
    pub fn set_cursor_ms(&mut self, time_ms: u64) {
        self.cursor_ms = time_ms.min(self.total_duration_ms());
    }

    pub fn select_clip(&mut self, clip_id: Uuid) -> Result<(), EngineError> {
        if self.clip(clip_id).is_none() {
            return Err(EngineError::ClipNotFound(clip_id));
        }
        self.selected_clip = Some(clip_id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected_clip = None;
    }

    #[must_use]
    pub fn selected_clip(&self) -> Option<Uuid> {
        self.selected_clip
    }

    // ===== Dirty tracking =====

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Re-checks every structural invariant. Used by the load path before a
    /// deserialized timeline is allowed to replace the current one.
    pub fn validate(&self) -> Result<(), EngineError> {
        for (index, clip) in self.clips.iter().enumerate() {
            if self.clips[index + 1..].iter().any(|other| other.id == clip.id) {
                return Err(EngineError::Deserialization(format!(
                    "duplicate clip id: {}",
                    clip.id
                )));
            }
            if !clip.trim_is_valid() {
                return Err(EngineError::Deserialization(format!(
                    "clip {} has invalid trim range {}..{} for source length {}",
                    clip.id, clip.trim_start_ms, clip.trim_end_ms, clip.source.duration_ms
                )));
            }
        }
        if let Some((clip, other, track)) = self.detect_overlaps().first().copied() {
            return Err(EngineError::Deserialization(format!(
                "clips {clip} and {other} overlap on track {track}"
            )));
        }
        for (index, track) in self.audio_tracks.iter().enumerate() {
            if self.audio_tracks[index + 1..]
                .iter()
                .any(|other| other.id == track.id)
            {
                return Err(EngineError::Deserialization(format!(
                    "duplicate audio track id: {}",
                    track.id
                )));
            }
        }
        Ok(())
    }

    /// Rebuilds internal ordering after deserialization.
    pub(crate) fn normalize(&mut self) {
        self.sort_clips();
        self.cursor_ms = 0;
        self.selected_clip = None;
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceMetadata;

    fn clip_at(start_ms: u64, source_len: u64, track: u32) -> VideoClip {
        VideoClip::new("clip", SourceMetadata::new("src.mp4", source_len), start_ms, track)
    }

    #[test]
    fn detect_overlaps_only_within_same_track() {
        let mut timeline = Timeline::default();
        timeline.add_clip(clip_at(0, 5_000, 0)).expect("add a");
        timeline.add_clip(clip_at(1_000, 5_000, 1)).expect("add b");
        assert!(timeline.detect_overlaps().is_empty());
    }

    #[test]
    fn cursor_clamps_to_duration() {
        let mut timeline = Timeline::default();
        timeline.add_clip(clip_at(0, 3_000, 0)).expect("add");
        timeline.set_cursor_ms(10_000);
        assert_eq!(timeline.cursor_ms(), 3_000);
    }

    #[test]
    fn solo_mutes_other_tracks_for_mix() {
        use crate::model::{AudioTrack, AudioTrackKind};

        let mut timeline = Timeline::default();
        let music = timeline.add_audio_track(AudioTrack::new("Music", AudioTrackKind::Music));
        let voice = timeline.add_audio_track(AudioTrack::new("VO", AudioTrackKind::Voiceover));

        assert_eq!(timeline.is_track_audible(music), Some(true));

        timeline.audio_track_mut(voice).expect("track").solo = true;
        assert_eq!(timeline.is_track_audible(music), Some(false));
        assert_eq!(timeline.is_track_audible(voice), Some(true));
    }
}
