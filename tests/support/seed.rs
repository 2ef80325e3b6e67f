//! Engine seeding shortcuts.

use rust_decimal::Decimal;

use poolmarket::domain::{Amount, Market, MarketId, UserId, Wallet};
use poolmarket::infrastructure::bootstrap::Engine;
use poolmarket::port::inbound::market::MarketService;
use poolmarket::port::inbound::wallet::WalletService;
use poolmarket::port::outbound::store::Store;
use poolmarket::testkit::domain::{usd, verified_user};

/// Register a verified user and fund their USD wallet.
pub fn register<S: Store>(engine: &Engine<S>, user: &str, balance: Amount) {
    engine
        .wallets
        .upsert_user(verified_user(user))
        .expect("upsert user");
    if balance > Decimal::ZERO {
        engine
            .wallets
            .deposit(&UserId::new(user), &usd(), balance, "seed")
            .expect("seed deposit");
    }
}

pub fn import<S: Store>(engine: &Engine<S>, market: Market) -> Market {
    engine.markets.import_market(market).expect("import market")
}

pub fn wallet<S: Store>(engine: &Engine<S>, user: &str) -> Wallet {
    engine
        .wallets
        .wallet(&UserId::new(user), &usd())
        .expect("load wallet")
}

pub fn balance<S: Store>(engine: &Engine<S>, user: &str) -> Amount {
    wallet(engine, user).balance()
}

pub fn market<S: Store>(engine: &Engine<S>, id: &str) -> Market {
    engine
        .markets
        .market(&MarketId::new(id))
        .expect("load market")
}
