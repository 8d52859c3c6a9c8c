//! Synthetic MPEG-4 clips for tests that need a real container on disk.

use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;
use ffmpeg_next::{Packet, Rational};

/// Encodes `num_frames` flat grey frames whose brightness steps by 40 per
/// frame, so consecutive frames are distinguishable after decoding.
pub(crate) fn write_test_video(path: &Path, num_frames: usize, width: u32, height: u32, fps: i32) {
    ffmpeg_next::init().unwrap();

    let mut octx = ffmpeg_next::format::output(path).unwrap();
    let needs_global_header = octx
        .format()
        .flags()
        .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

    let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
    let mut ost = octx.add_stream(Some(codec)).unwrap();

    let mut ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
        .encoder()
        .video()
        .unwrap();
    ctx.set_width(width);
    ctx.set_height(height);
    ctx.set_format(Pixel::YUV420P);
    ctx.set_time_base(Rational(1, fps));
    ctx.set_frame_rate(Some(Rational(fps, 1)));
    if needs_global_header {
        ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
    }

    let mut encoder = ctx.open_with(ffmpeg_next::Dictionary::new()).unwrap();
    ost.set_parameters(&encoder);
    octx.write_header().unwrap();
    let stream_time_base = octx.stream(0).unwrap().time_base();

    let mut to_yuv = scaling::Context::get(
        Pixel::RGB24,
        width,
        height,
        Pixel::YUV420P,
        width,
        height,
        scaling::Flags::BILINEAR,
    )
    .unwrap();

    for i in 0..num_frames {
        let mut rgb = Video::new(Pixel::RGB24, width, height);
        let stride = rgb.stride(0);
        let shade = ((i * 40) % 256) as u8;
        let plane = rgb.data_mut(0);
        for row in 0..height as usize {
            plane[row * stride..row * stride + width as usize * 3].fill(shade);
        }

        let mut yuv = Video::empty();
        to_yuv.run(&rgb, &mut yuv).unwrap();
        yuv.set_pts(Some(i as i64));
        encoder.send_frame(&yuv).unwrap();

        let mut packet = Packet::empty();
        while encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(0);
            packet.rescale_ts(Rational(1, fps), stream_time_base);
            packet.write_interleaved(&mut octx).unwrap();
        }
    }

    encoder.send_eof().unwrap();
    let mut packet = Packet::empty();
    while encoder.receive_packet(&mut packet).is_ok() {
        packet.set_stream(0);
        packet.rescale_ts(Rational(1, fps), stream_time_base);
        packet.write_interleaved(&mut octx).unwrap();
    }
    octx.write_trailer().unwrap();
}
