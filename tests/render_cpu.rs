use backdrop::{
    Backdrop, BackdropConfig, CpuSurface, Dimensions, EngineState, FrameOutcome, FrameRGBA,
    Intensity, ManualHost, RenderOpts, Variant, render_frame, render_frames,
};

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn digest_u64(bytes: &[u8]) -> u64 {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for chunk in bytes.chunks(8) {
        let mut v = 0u64;
        for (i, &b) in chunk.iter().enumerate() {
            v |= (b as u64) << (i * 8);
        }
        state = mix64(state ^ v);
    }
    state
}

fn opts(width: u32, height: u32, seed: u64) -> RenderOpts {
    let mut opts = RenderOpts::new(Dimensions::new(width, height));
    opts.seed = Some(seed);
    opts
}

fn painted_pixels(frame: &FrameRGBA) -> usize {
    frame.data.chunks_exact(4).filter(|px| px[3] != 0).count()
}

#[test]
fn cpu_render_is_deterministic_and_nonempty() {
    for variant in [Variant::Grid, Variant::Dots, Variant::Waves] {
        let config = BackdropConfig::new(variant, "#ffffff", Intensity::Strong);
        let a = render_frame(&config, &opts(128, 96, 7)).unwrap();
        let b = render_frame(&config, &opts(128, 96, 7)).unwrap();

        assert_eq!(a.width, 128);
        assert_eq!(a.height, 96);
        assert!(a.premultiplied);
        assert_eq!(digest_u64(&a.data), digest_u64(&b.data), "{variant}");
        assert!(painted_pixels(&a) > 0, "{variant}");
    }
}

#[test]
fn grid_animates_over_time() {
    let config = BackdropConfig::new(Variant::Grid, "#ffffff", Intensity::Strong);
    let mut early = opts(120, 120, 1);
    early.start_seconds = 0.0;
    let mut late = opts(120, 120, 1);
    late.start_seconds = 2.0;

    let a = render_frame(&config, &early).unwrap();
    let b = render_frame(&config, &late).unwrap();
    assert_ne!(digest_u64(&a.data), digest_u64(&b.data));
}

#[test]
fn dots_drift_between_frames() {
    let config = BackdropConfig::new(Variant::Dots, "#ffffff", Intensity::Strong);
    let mut digests = Vec::new();
    render_frames(&config, &opts(200, 200, 3), 40, |_, frame| {
        digests.push(digest_u64(&frame.data));
        Ok(())
    })
    .unwrap();
    assert_eq!(digests.len(), 40);
    assert_ne!(digests.first(), digests.last());
}

#[test]
fn waves_stay_below_the_top_half() {
    let config = BackdropConfig::new(Variant::Waves, "#ffffff", Intensity::Medium);
    let frame = render_frame(&config, &opts(200, 200, 0)).unwrap();

    // Baselines start at half height and the tallest amplitude is height / 10.
    let top_rows = 200 * 4 * 70;
    assert!(frame.data[..top_rows].iter().all(|&b| b == 0));
    assert!(painted_pixels(&frame) > 0);
}

#[test]
fn overlay_content_is_painted_above_animation() {
    let config = BackdropConfig::new(Variant::Grid, "#ffffff", Intensity::Strong);
    let dims = Dimensions::new(64, 64);
    let mut content = FrameRGBA::transparent(dims);
    for px in content.data.chunks_exact_mut(4) {
        px.copy_from_slice(&[255, 0, 0, 255]);
    }
    let mut o = opts(64, 64, 0);
    o.content = Some(content);

    let frame = render_frame(&config, &o).unwrap();
    assert!(frame.data.chunks_exact(4).all(|px| px == [255, 0, 0, 255]));
}

#[test]
fn cpu_engine_mounted_at_zero_size_draws_after_resize() {
    let config = BackdropConfig::new(Variant::Grid, "#ffffff", Intensity::Strong);
    let mut host = ManualHost::new();
    let mut engine = Backdrop::<CpuSurface>::new(config);
    engine.mount(&Dimensions::ZERO, CpuSurface::new(Dimensions::ZERO), &mut host);
    assert_eq!(engine.state(), EngineState::Mounted);

    let token = host.next_frame().unwrap();
    assert_eq!(engine.tick(token, 0.0, &mut host), FrameOutcome::Skipped);

    engine.resize_handle().notify(Dimensions::new(64, 64));
    let token = host.next_frame().unwrap();
    assert_eq!(engine.tick(token, 0.0, &mut host), FrameOutcome::Drawn);

    let frame = engine.surface().unwrap().readback();
    assert_eq!((frame.width, frame.height), (64, 64));
    assert!(painted_pixels(&frame) > 0);
}
