use potato_audio::{
    AudioData, AudioEngine, AudioEngineDesc, AudioEvent, AudioSession, MovementState,
    PlayState, PotatoAudioError, Sound, SoundConfig, Vec3,
};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

const INTERVAL: Duration = Duration::from_millis(5);

fn desc() -> AudioEngineDesc {
    AudioEngineDesc::new()
        .sample_rate(8000)
        .channels(2)
        .movement_interval(INTERVAL)
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine() -> AudioEngine {
    init_logger();
    AudioEngine::new(desc()).expect("engine")
}

fn tone(frames: usize) -> AudioData {
    let samples = (0..frames).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
    AudioData::from_samples(samples, 8000, 1).expect("tone")
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Writes a 16-bit PCM mono WAV file and returns its path.
fn write_wav(name: &str, sample_rate: u32, samples: &[i16]) -> PathBuf {
    let data_len = (samples.len() * 2) as u32;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }

    let path = std::env::temp_dir().join(format!(
        "potato-audio-{}-{}.wav",
        std::process::id(),
        name
    ));
    std::fs::write(&path, bytes).expect("write wav");
    path
}

#[test]
fn destroying_sounds_leaves_no_workers() {
    let engine = engine();
    {
        let mut a = Sound::from_data(&engine, tone(800), SoundConfig::default()).unwrap();
        let mut b = Sound::from_data(&engine, tone(800), SoundConfig::default()).unwrap();
        for i in 0..10 {
            a.enable_3d_movement(i % 2 == 0).unwrap();
            b.enable_3d_movement(i % 3 == 0).unwrap();
        }
        a.enable_3d_movement(true).unwrap();
        b.enable_3d_movement(true).unwrap();
        assert_eq!(engine.active_movement_workers(), 2);
    }
    assert_eq!(engine.active_movement_workers(), 0);
    assert_eq!(engine.sound_count(), 0);
}

#[test]
fn enabling_twice_does_not_spawn_a_second_worker() {
    let engine = engine();
    let mut sound = Sound::from_data(&engine, tone(800), SoundConfig::default()).unwrap();
    sound.enable_3d_movement(true).unwrap();
    sound.enable_3d_movement(true).unwrap();
    assert_eq!(sound.movement_state(), MovementState::Running);
    assert_eq!(engine.active_movement_workers(), 1);
}

#[test]
fn disabling_an_idle_sound_is_a_noop() {
    let engine = engine();
    let mut sound = Sound::from_data(&engine, tone(800), SoundConfig::default()).unwrap();
    sound.enable_3d_movement(false).unwrap();
    assert_eq!(sound.movement_state(), MovementState::Idle);
    assert!(!sound.is_movement_enabled());
    assert!(!sound.is_movement_running());
    assert_eq!(engine.active_movement_workers(), 0);
}

#[test]
fn position_reaches_engine_within_an_interval() {
    let engine = engine();
    let mut sound = Sound::from_data(&engine, tone(800), SoundConfig::default()).unwrap();
    sound.enable_3d_movement(true).unwrap();

    sound.set_position(1.0, 2.0, 3.0).unwrap();
    thread::sleep(INTERVAL * 3);
    assert!(wait_until(
        || engine.sound_position(sound.id()).unwrap() == Vec3::new(1.0, 2.0, 3.0)
    ));
}

#[test]
fn only_the_last_of_quick_moves_sticks() {
    let engine = engine();
    let mut sound = Sound::from_data(&engine, tone(800), SoundConfig::default()).unwrap();
    sound.enable_3d_movement(true).unwrap();

    sound.set_position(1.0, 0.0, 0.0).unwrap();
    sound.set_position(0.0, 1.0, 0.0).unwrap();
    sound.set_position(0.0, 0.0, 1.0).unwrap();

    let last = Vec3::new(0.0, 0.0, 1.0);
    assert!(wait_until(|| engine.sound_position(sound.id()).unwrap() == last));
    thread::sleep(INTERVAL * 4);
    assert_eq!(engine.sound_position(sound.id()).unwrap(), last);
}

#[test]
fn position_without_movement_is_applied_once() {
    let engine = engine();
    let sound = Sound::from_data(&engine, tone(800), SoundConfig::default()).unwrap();
    let before = engine.position_updates();

    sound.set_position(1.0, 2.0, 3.0).unwrap();
    assert_eq!(
        engine.sound_position(sound.id()).unwrap(),
        Vec3::new(1.0, 2.0, 3.0)
    );
    assert_eq!(engine.position_updates(), before + 1);

    thread::sleep(INTERVAL * 4);
    assert_eq!(engine.position_updates(), before + 1);
}

#[test]
fn drop_while_running_joins_before_release() {
    let engine = engine();
    let mut sound = Sound::from_data(&engine, tone(800), SoundConfig::default()).unwrap();
    let id = sound.id();
    sound.enable_3d_movement(true).unwrap();
    assert!(wait_until(|| engine.position_updates() > 0));

    drop(sound);
    assert_eq!(engine.active_movement_workers(), 0);
    assert!(!engine.contains_sound(id));

    let after_drop = engine.position_updates();
    thread::sleep(INTERVAL * 5);
    assert_eq!(engine.position_updates(), after_drop);
}

#[test]
fn movement_can_start_from_config() {
    let engine = engine();
    let sound = Sound::from_data(
        &engine,
        tone(800),
        SoundConfig::spatial(Vec3::new(0.0, 0.0, -2.0)).movement_enabled(true),
    )
    .unwrap();
    assert_eq!(sound.movement_state(), MovementState::Running);
    assert!(sound.is_movement_running());

    let events = engine.poll_events();
    assert!(events.contains(&AudioEvent::MovementStarted {
        sound_id: sound.id()
    }));
}

#[test]
fn movement_events_follow_transitions() {
    let engine = engine();
    let mut sound = Sound::from_data(&engine, tone(800), SoundConfig::default()).unwrap();
    let id = sound.id();
    sound.enable_3d_movement(true).unwrap();
    sound.enable_3d_movement(true).unwrap();
    sound.enable_3d_movement(false).unwrap();
    sound.stop_movement();

    let movement: Vec<_> = engine
        .poll_events()
        .into_iter()
        .filter(|e| {
            matches!(
                e,
                AudioEvent::MovementStarted { .. } | AudioEvent::MovementStopped { .. }
            )
        })
        .collect();
    assert_eq!(
        movement,
        vec![
            AudioEvent::MovementStarted { sound_id: id },
            AudioEvent::MovementStopped { sound_id: id },
        ]
    );
}

#[test]
fn playback_controls_reach_the_engine() {
    let engine = engine();
    let sound = Sound::from_data(&engine, tone(800), SoundConfig::non_spatial()).unwrap();

    sound.set_volume(0.25).unwrap();
    sound.set_pitch(1.5).unwrap();
    sound.set_looping(true).unwrap();
    let info = sound.playback_info().unwrap();
    assert_eq!(info.volume, 0.25);
    assert_eq!(info.pitch, 1.5);
    assert!(info.looping);

    sound.play().unwrap();
    assert!(sound.is_playing());

    let mut block = vec![0.0f32; 200];
    engine.render(&mut block);
    assert!(block.iter().any(|s| *s != 0.0));

    sound.pause().unwrap();
    assert_eq!(sound.playback_info().unwrap().play_state, PlayState::Paused);
    let frame = sound.playback_info().unwrap().current_frame;
    engine.render(&mut block);
    assert!(block.iter().all(|s| *s == 0.0));
    assert_eq!(sound.playback_info().unwrap().current_frame, frame);

    sound.resume().unwrap();
    assert!(sound.is_playing());
    sound.restart().unwrap();
    assert_eq!(sound.playback_info().unwrap().current_frame, 0);
}

#[test]
fn loads_wav_from_disk() {
    let samples: Vec<i16> = (0..4000).map(|i| ((i % 100) * 100) as i16).collect();
    let path = write_wav("load", 4000, &samples);

    let engine = engine();
    let sound = Sound::new(&engine, &path).unwrap();
    assert_eq!(sound.path(), Some(path.as_path()));

    // One second at 4 kHz resampled to the engine's 8 kHz.
    let info = sound.playback_info().unwrap();
    assert_eq!(info.total_frames, 8000);
    assert!((info.total_time - 1.0).abs() < 1e-6);

    std::fs::remove_file(path).ok();
}

#[test]
fn missing_file_is_reported_at_construction() {
    let engine = engine();
    let result = Sound::new(&engine, "definitely/not/here.wav");
    assert!(matches!(result, Err(PotatoAudioError::Io(_))));
    assert_eq!(engine.sound_count(), 0);
}

#[test]
fn undecodable_file_is_reported_at_construction() {
    let path = std::env::temp_dir().join(format!("potato-audio-{}-junk.wav", std::process::id()));
    std::fs::write(&path, b"this is not audio").unwrap();

    let engine = engine();
    let result = Sound::new(&engine, &path);
    assert!(matches!(result, Err(PotatoAudioError::AudioLoading(_))));

    std::fs::remove_file(path).ok();
}

#[test]
fn session_failure_leaves_other_sounds_alone() {
    init_logger();
    let mut session = AudioSession::new(desc()).unwrap();
    let good = session
        .add_sound_data(tone(800), SoundConfig::non_spatial())
        .unwrap();
    session.sound(good).unwrap().play().unwrap();

    assert!(session.play_sound("missing/boom.wav").is_err());

    assert_eq!(session.sound_ids(), vec![good]);
    assert!(session.sound(good).unwrap().is_playing());
    assert_eq!(session.engine().sound_count(), 1);
}

#[test]
fn session_play_sound_from_disk() {
    let samples: Vec<i16> = vec![1000; 800];
    let path = write_wav("session", 8000, &samples);

    init_logger();
    let mut session = AudioSession::new(desc()).unwrap();
    let id = session.play_sound(&path).unwrap();
    assert!(session.sound(id).unwrap().is_playing());
    assert!(
        session
            .poll_events()
            .contains(&AudioEvent::SoundStarted { sound_id: id })
    );

    std::fs::remove_file(path).ok();
}

#[test]
fn session_shutdown_joins_every_worker() {
    init_logger();
    let mut session = AudioSession::new(desc()).unwrap();
    let engine = session.engine().clone();
    for _ in 0..4 {
        let id = session
            .add_sound_data(tone(800), SoundConfig::default().movement_enabled(true))
            .unwrap();
        session.sound(id).unwrap().set_position(1.0, 0.0, 0.0).unwrap();
    }
    assert_eq!(engine.active_movement_workers(), 4);

    session.shutdown();
    assert_eq!(engine.active_movement_workers(), 0);
    assert_eq!(engine.sound_count(), 0);
    assert!(session.sound_ids().is_empty());
}

#[test]
fn session_remove_sound_releases_handle() {
    init_logger();
    let mut session = AudioSession::new(desc()).unwrap();
    let id = session
        .add_sound_data(tone(800), SoundConfig::default().movement_enabled(true))
        .unwrap();
    assert!(session.remove_sound(id));
    assert!(!session.remove_sound(id));
    assert!(!session.engine().contains_sound(id));
    assert_eq!(session.engine().active_movement_workers(), 0);
}

#[test]
fn session_listener_and_echo() {
    init_logger();
    let session = AudioSession::new(desc()).unwrap();
    session.set_listener_position(1.0, 2.0, 3.0);
    assert_eq!(session.engine().listener().position, Vec3::new(1.0, 2.0, 3.0));

    session.enable_echo();
    assert!(session.engine().is_echo_enabled());
    session.disable_echo();
    assert!(!session.engine().is_echo_enabled());
}
