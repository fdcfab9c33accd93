use liveevent::*;

// A session screen that is torn down and rebuilt while a logout signal is
// pending. The rebuilt screen must not log out a second time.
struct SessionScreen {
    _logout: ObserverHandle<std::sync::Arc<Event<()>>>,
}

impl SessionScreen {
    async fn attach(signal: &EventLiveData<()>, generation: u32) -> Result<Self> {
        let handle = signal
            .observe_event("session-screen", move |_: &()| {
                println!("screen #{generation}: logging out");
            })
            .await?;
        println!("screen #{generation}: attached");
        Ok(Self { _logout: handle })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let logout = SimpleEventLiveData::with_config(Config::default().with_name("logout"))?;
    let view = logout.as_live_data();

    let screen = SessionScreen::attach(&view, 1).await?;
    logout.fire()?;
    logout.flush().await?;

    // Rotation: the old screen goes away, a new one subscribes with the same key
    // and is replayed the latest event, which it has already consumed.
    drop(screen);
    let screen = SessionScreen::attach(&view, 2).await?;
    view.flush().await?;

    // A fresh signal reaches the new screen exactly once.
    logout.fire()?;
    logout.flush().await?;

    drop(screen);
    logout.close().await
}
