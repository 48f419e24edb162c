use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use kestrel_core::config::{ApplicationConfig, ContentConfig};
use kestrel_sdk::prelude::*;

/// Logs every lifecycle hook the runtime calls.
struct LoggingDelegate;

impl RuntimeDelegate for LoggingDelegate {
    fn did_load_config(&mut self, config: &ApplicationConfig) {
        log::info!(
            "config loaded: {}x{} @ {:?} fps",
            config.content.width,
            config.content.height,
            config.content.fps
        );
    }

    fn did_suspend(&mut self) {
        log::info!("delegate: suspended");
    }

    fn did_resume(&mut self) {
        log::info!("delegate: resumed");
    }

    fn will_destroy(&mut self) {
        log::info!("delegate: destroying");
    }
}

fn write_application(dir: &std::path::Path) -> anyhow::Result<()> {
    let config = ApplicationConfig {
        show_runtime_errors: Some(true),
        content: ContentConfig {
            width: 320,
            height: 480,
            fps: Some(60),
            ..ContentConfig::default()
        },
    };
    std::fs::write(dir.join("config.json"), config.to_json_string()?)?;
    std::fs::write(dir.join("main.lua"), "-- entry point, run natively\n")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let app_dir = tempfile::tempdir()?;
    write_application(app_dir.path())?;

    let suspends = Rc::new(Cell::new(0u32));
    let seen = suspends.clone();

    let mut builder = EngineBuilder::new(app_dir.path())
        .delegate(LoggingDelegate)
        .launch_arg("player", "sandbox")
        .chunk("main", move |scope, args| {
            log::info!("main running with {args:?}");
            let seen = seen.clone();
            scope.on_event(SystemEvent::AppSuspend, EventScope::Application, move |_| {
                seen.set(seen.get() + 1);
                Ok(())
            });
            scope.on_event(SystemEvent::AppExit, EventScope::Application, |_| {
                log::info!("main: goodbye");
                Ok(())
            });
            Ok(())
        })
        .job_handler("checksum", |payload| {
            let sum: u32 = payload.bytes().map(u32::from).sum();
            Some(sum.to_string())
        });
    let listener = builder.add_job_listener(|result| {
        log::info!("checksum job finished: {result:?}");
        Ok(())
    });

    let mut engine = builder.launch()?;

    let ticks = engine.run_for(Duration::from_millis(250));
    log::info!("ran {ticks} ticks, {} frames rendered", engine.rendered_frames());

    engine.start_job("checksum:kestrel", Some(listener))?;
    engine.suspend();
    log::info!("suspended; app saw {} suspend event(s)", suspends.get());
    std::thread::sleep(Duration::from_millis(100));
    engine.resume();

    engine.run_frames(10);
    log::info!(
        "elapsed {:.0} ms of application time at frame {}",
        engine.runtime().elapsed_ms(),
        engine.runtime().frame()
    );

    for event in engine.runtime().events().drain() {
        log::debug!("bus: {event:?}");
    }

    engine.shutdown();
    Ok(())
}
