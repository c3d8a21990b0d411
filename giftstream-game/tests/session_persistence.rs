use std::hash::Hasher;

use giftstream_game::constants::{STORAGE_KEY_GAME, STORAGE_KEY_SOCIAL, STORAGE_KEY_WALLET};
use giftstream_game::{
    Cents, EconomyConfig, EffectKind, GameEngine, GameStorage, MemoryStorage, PowerUp, Session,
};
use twox_hash::XxHash64;

fn play(session: &mut Session, steps: u64) -> Vec<String> {
    let mut transcript = Vec::new();
    session.connect_wallet();
    for step in 0..steps {
        let now = step * 100;
        let tick = session.tick(now);
        if let Some(gift) = tick.spawned {
            transcript.push(format!("spawn {} {} {}", gift.id, gift.rarity, gift.cost));
        }
        if step % 15 == 0 {
            if let Some(gift) = session.boxes().first().copied() {
                match session.unbox(gift.id, now) {
                    Ok(outcome) => transcript.push(format!(
                        "unbox {} reward {} coins {}",
                        outcome.box_id, outcome.reward, outcome.coins
                    )),
                    Err(err) => transcript.push(format!("refused {err}")),
                }
            }
        }
    }
    transcript
}

fn digest(lines: &[String]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    for line in lines {
        hasher.write(line.as_bytes());
        hasher.write_u8(b'\n');
    }
    hasher.finish()
}

#[test]
fn same_seed_replays_identically() {
    let mut a = Session::new(0xC0FFEE, EconomyConfig::default(), 0);
    let mut b = Session::new(0xC0FFEE, EconomyConfig::default(), 0);
    let first = play(&mut a, 600);
    let second = play(&mut b, 600);
    assert!(first.iter().any(|line| line.starts_with("unbox")));
    assert_eq!(digest(&first), digest(&second));
    assert_eq!(a.wallet(), b.wallet());
    assert_eq!(a.social(), b.social());
}

#[test]
fn different_seeds_diverge() {
    let mut a = Session::new(1, EconomyConfig::default(), 0);
    let mut b = Session::new(2, EconomyConfig::default(), 0);
    assert_ne!(digest(&play(&mut a, 300)), digest(&play(&mut b, 300)));
}

#[test]
fn save_then_load_restores_every_bucket() {
    let engine = GameEngine::new(MemoryStorage::new(), EconomyConfig::default());
    let mut session = engine.create_session(42, 0).unwrap();
    play(&mut session, 200);
    session.buy_power_up(PowerUp::SlowMo).unwrap();
    session.join_guild("guild_1").unwrap();
    engine.save_session(&session).unwrap();

    let restored = engine.load_session(42, session.now_ms()).unwrap();
    assert_eq!(restored.wallet(), session.wallet());
    assert_eq!(restored.game(), session.game());
    assert_eq!(restored.social(), session.social());
    assert_eq!(
        restored.shop().stock(PowerUp::SlowMo),
        session.shop().stock(PowerUp::SlowMo)
    );
}

#[test]
fn restored_session_keeps_box_ids_unique() {
    let engine = GameEngine::new(MemoryStorage::new(), EconomyConfig::default());
    let mut session = engine.create_session(8, 0).unwrap();
    play(&mut session, 100);
    let last_id = session.game().next_box_id;
    engine.save_session(&session).unwrap();

    let mut restored = engine.load_session(8, 20_000).unwrap();
    let gift = restored.tick(20_000).spawned.unwrap();
    assert_eq!(gift.id, last_id);
}

#[test]
fn corrupt_buckets_load_as_defaults() {
    let storage = MemoryStorage::new();
    storage.set(STORAGE_KEY_WALLET, "not json").unwrap();
    storage.set(STORAGE_KEY_GAME, "{\"coins\": \"lots\"}").unwrap();
    storage.set(STORAGE_KEY_SOCIAL, "{\"profile\": 5}").unwrap();
    let engine = GameEngine::new(storage, EconomyConfig::default());
    let session = engine.load_session(5, 0).unwrap();
    assert!(!session.wallet().connected);
    assert_eq!(session.coins(), Cents::from_whole(500));
    assert_eq!(session.social().friends.len(), 5);
}

#[test]
fn negative_stored_balances_load_as_defaults() {
    let storage = MemoryStorage::new();
    storage
        .set(
            STORAGE_KEY_WALLET,
            r#"{"connected": true, "address": "0xabc", "balance": -100}"#,
        )
        .unwrap();
    storage.set(STORAGE_KEY_GAME, r#"{"coins": -500}"#).unwrap();
    let engine = GameEngine::new(storage, EconomyConfig::default());
    let session = engine.load_session(8, 0).unwrap();
    assert_eq!(session.coins(), Cents::from_whole(500));
    assert!(!session.wallet().connected);
    assert_eq!(session.wallet().balance(), Cents::ZERO);
}

#[test]
fn expired_effects_are_dropped_on_load() {
    let engine = GameEngine::new(MemoryStorage::new(), EconomyConfig::default());
    let mut session = engine.create_session(6, 0).unwrap();
    session.buy_power_up(PowerUp::Freeze).unwrap();
    session.buy_power_up(PowerUp::GoldRush).unwrap();
    assert!(session.use_power_up(PowerUp::Freeze, 0));
    assert!(session.use_power_up(PowerUp::GoldRush, 0));
    engine.save_session(&session).unwrap();

    let restored = engine.load_session(6, 10_000).unwrap();
    let kinds: Vec<_> = restored
        .game()
        .effects
        .effects()
        .iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(kinds, vec![EffectKind::RewardMultiplier]);
    assert!(restored.modifiers().reward_multiplier > 1.0);
}

#[test]
fn shop_stock_never_goes_negative() {
    let mut session = Session::new(12, EconomyConfig::default(), 0);
    for _ in 0..20 {
        let _ = session.buy_power_up(PowerUp::Freeze);
        let _ = session.buy_power_up(PowerUp::SlowMo);
    }
    assert!(session.shop().stock(PowerUp::Freeze) <= 12);
    assert!(session.coins() >= Cents::ZERO);
}
