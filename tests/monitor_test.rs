use std::cell::RefCell;
use std::time::Duration;

use artifact_sync::monitor::{Monitor, MonitorPolicy, Trigger};
use artifact_sync::{Detector, Options, Page, Request};
use tokio::time::sleep;

const PAGE: &str = r#"<pre><code class="language-go">package main

func main() {
	total := 0
	for i := 0; i &lt; 10; i++ {
		total += i
	}
}</code></pre>"#;

#[tokio::test(start_paused = true)]
async fn monitored_detector_scans_on_startup_and_settled_bursts() {
    let detector = Detector::new(Options::immediate());
    let page = Page::parse(PAGE);
    detector.handle(Request::ToggleMonitoring { enabled: true }, &page).await;

    let triggers = RefCell::new(Vec::new());
    let (observer, monitor) = Monitor::connect(MonitorPolicy::default());

    let (seen, detector_ref, page_ref) = (&triggers, &detector, &page);
    let watcher = monitor.watch(move |trigger| {
        seen.borrow_mut().push(trigger);
        async move {
            detector_ref.on_trigger(trigger, page_ref).await;
        }
    });
    let host = async move {
        sleep(Duration::from_millis(1200)).await;
        // two separate bursts
        for _ in 0..3 {
            observer.notify();
            sleep(Duration::from_millis(50)).await;
        }
        sleep(Duration::from_secs(2)).await;
        observer.notify();
        sleep(Duration::from_secs(2)).await;
        drop(observer);
    };
    tokio::join!(watcher, host);

    assert_eq!(
        *triggers.borrow(),
        vec![
            Trigger::Startup,
            Trigger::Mutations { coalesced: 3 },
            Trigger::Mutations { coalesced: 1 },
        ]
    );
    assert_eq!(detector.scan_count(), 3);
    assert_eq!(detector.store().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn disabled_monitoring_ignores_triggers() {
    let detector = Detector::new(Options::immediate());
    let page = Page::parse(PAGE);
    let (mut observer, monitor) = Monitor::connect(MonitorPolicy::default());

    let (detector_ref, page_ref) = (&detector, &page);
    let watcher = monitor.watch(move |trigger| async move {
        detector_ref.on_trigger(trigger, page_ref).await;
    });
    let host = async move {
        sleep(Duration::from_millis(1500)).await;
        observer.notify();
        observer.disconnect();
    };
    tokio::join!(watcher, host);

    assert_eq!(detector.scan_count(), 0);
    assert!(detector.store().is_empty());
}
