use std::path::Path;

use log::debug;

use crate::video::domain::container_repairer::ContainerRepairer;

/// Repairs containers by stream-copying audio and video packets into a new
/// file. Nothing is re-encoded; an MP4 output gets its index written up
/// front so a truncated or misplaced `moov` atom is rebuilt.
pub struct FfmpegRemuxer;

impl ContainerRepairer for FfmpegRemuxer {
    fn repair(&self, input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(input)
            .map_err(|e| format!("cannot open {} for repair: {e}", input.display()))?;
        let mut octx = ffmpeg_next::format::output(output)
            .map_err(|e| format!("cannot create {}: {e}", output.display()))?;

        // input stream index -> (output stream index, input time base)
        let mut mapping: Vec<Option<(usize, ffmpeg_next::Rational)>> =
            vec![None; ictx.nb_streams() as usize];

        for istream in ictx.streams() {
            let medium = istream.parameters().medium();
            if medium != ffmpeg_next::media::Type::Video && medium != ffmpeg_next::media::Type::Audio
            {
                continue;
            }
            let mut ostream =
                octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
            ostream.set_parameters(istream.parameters());
            // The source tag may not be valid in the target container.
            unsafe {
                (*ostream.parameters().as_mut_ptr()).codec_tag = 0;
            }
            mapping[istream.index()] = Some((ostream.index(), istream.time_base()));
        }

        if mapping.iter().all(Option::is_none) {
            return Err(format!("{} has no audio or video streams", input.display()).into());
        }

        let mut options = ffmpeg_next::Dictionary::new();
        options.set("movflags", "+faststart");
        octx.write_header_with(options)?;

        let mut copied = 0usize;
        for (stream, mut packet) in ictx.packets() {
            let Some((out_index, in_time_base)) = mapping[stream.index()] else {
                continue;
            };
            let out_time_base = octx
                .stream(out_index)
                .ok_or("output stream vanished")?
                .time_base();
            packet.rescale_ts(in_time_base, out_time_base);
            packet.set_position(-1);
            packet.set_stream(out_index);
            packet.write_interleaved(&mut octx)?;
            copied += 1;
        }

        octx.write_trailer()?;
        debug!(
            "Remuxed {} -> {} ({copied} packets)",
            input.display(),
            output.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::domain::video_reader::VideoReader;
    use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
    use crate::video::test_video::write_test_video;

    #[test]
    fn test_remux_keeps_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.mp4");
        let repaired = dir.path().join("repaired.mp4");
        write_test_video(&source, 6, 64, 48, 30);

        FfmpegRemuxer.repair(&source, &repaired).unwrap();

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&repaired).unwrap();
        assert_eq!((meta.width, meta.height), (64, 48));
        assert_eq!(reader.frames().filter(|f| f.is_ok()).count(), 6);
    }

    #[test]
    fn test_remux_into_other_container() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.mp4");
        let repaired = dir.path().join("repaired.mkv");
        write_test_video(&source, 3, 64, 48, 30);

        FfmpegRemuxer.repair(&source, &repaired).unwrap();
        assert!(std::fs::metadata(&repaired).unwrap().len() > 0);
    }

    #[test]
    fn test_unopenable_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.mp4");
        std::fs::write(&source, b"\x00\x00\x00\x18ftypmp42").unwrap();

        let err = FfmpegRemuxer
            .repair(&source, &dir.path().join("out.mp4"))
            .unwrap_err();
        assert!(err.to_string().contains("cannot open"));
    }
}
