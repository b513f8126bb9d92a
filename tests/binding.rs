//! Endpoint binder behavior, exercised with in-process recording providers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::Method;
use serde_json::json;

use axum_cloud_tasks::{
    DeferredTask, DelayOptions, DelayedBinder, DelayedTaskProvider, JobHandle, ScheduleBinder,
    ScheduleJob, ScheduleJobUpdate, ScheduleProvider, TaskError, TaskHandle, TaskResult,
};

#[derive(Default)]
struct RecordingDelayer {
    provisioned: AtomicUsize,
    tasks: Mutex<Vec<DeferredTask>>,
    fail_enqueue: bool,
}

#[async_trait]
impl DelayedTaskProvider for RecordingDelayer {
    async fn provision(&self) -> TaskResult<()> {
        self.provisioned.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn enqueue_delayed(&self, task: DeferredTask) -> TaskResult<TaskHandle> {
        self.tasks.lock().unwrap().push(task);
        if self.fail_enqueue {
            return Err(TaskError::Backend {
                service: "mock",
                status: Some(500),
                message: "enqueue exploded".to_string(),
                source: None,
            });
        }
        Ok(TaskHandle {
            name: "t-1".to_string(),
        })
    }
}

#[derive(Default)]
struct RecordingScheduler {
    provisioned: AtomicUsize,
    jobs: Mutex<Vec<ScheduleJob>>,
    updates: Mutex<Vec<ScheduleJobUpdate>>,
    deletes: Mutex<Vec<String>>,
    fail_upsert: bool,
}

#[async_trait]
impl ScheduleProvider for RecordingScheduler {
    async fn provision(&self) -> TaskResult<()> {
        self.provisioned.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert_job(&self, job: ScheduleJob) -> TaskResult<JobHandle> {
        let name = job.resolved_name();
        self.jobs.lock().unwrap().push(job);
        if self.fail_upsert {
            return Err(TaskError::Backend {
                service: "mock",
                status: Some(500),
                message: "upsert exploded".to_string(),
                source: None,
            });
        }
        Ok(JobHandle { name })
    }

    async fn update_job(&self, update: ScheduleJobUpdate) -> TaskResult<JobHandle> {
        let name = update.name.clone();
        self.updates.lock().unwrap().push(update);
        Ok(JobHandle { name })
    }

    async fn delete_job(&self, name: &str) -> TaskResult<()> {
        self.deletes.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn bind_resolves_url_and_first_declared_method() {
    let provider = Arc::new(RecordingDelayer::default());
    let binder = DelayedBinder::new("https://svc.example.com", provider);

    let endpoint = binder
        .bind("/tasks/refresh", &[Method::PUT, Method::POST])
        .await
        .unwrap();
    assert_eq!(endpoint.endpoint_url(), "https://svc.example.com/tasks/refresh");
    assert_eq!(endpoint.http_method(), &Method::PUT);

    let bare = binder.bind("/tasks/other", &[]).await.unwrap();
    assert_eq!(bare.http_method(), &Method::POST);
}

#[tokio::test]
async fn bad_base_url_fails_binding() {
    let provider = Arc::new(RecordingDelayer::default());
    let binder = DelayedBinder::new("not a url", provider.clone());

    assert!(binder.bind("/x", &[Method::POST]).await.is_err());
    // Resolution failed before provisioning was attempted.
    assert_eq!(provider.provisioned.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rebinding_same_route_provisions_once() {
    let provider = Arc::new(RecordingDelayer::default());
    let binder = DelayedBinder::new("https://svc.example.com", provider.clone());

    binder.bind("/tasks/refresh", &[Method::POST]).await.unwrap();
    binder.bind("/tasks/refresh", &[Method::POST]).await.unwrap();
    assert_eq!(provider.provisioned.load(Ordering::SeqCst), 1);

    // A new route identity provisions again (the provider dedups backend
    // work internally).
    binder.bind("/tasks/other", &[Method::POST]).await.unwrap();
    assert_eq!(provider.provisioned.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn delay_builds_task_from_bound_route_plus_overrides() {
    let provider = Arc::new(RecordingDelayer::default());
    let binder = DelayedBinder::new("https://svc.example.com", provider.clone());
    let endpoint = binder.bind("/tasks/refresh", &[Method::POST]).await.unwrap();

    let mut options = DelayOptions::after_seconds(45);
    options.headers = HashMap::from([("H".to_string(), "v".to_string())]);
    options.body = Some(json!({"a": 1}));
    endpoint.delay(options).await;

    let tasks = provider.tasks.lock().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].endpoint_url, "https://svc.example.com/tasks/refresh");
    assert_eq!(tasks[0].http_method, Method::POST);
    assert_eq!(tasks[0].delay_seconds, 45);
    assert_eq!(tasks[0].timeout_seconds, 10.0);
    assert_eq!(tasks[0].headers.get("H").map(String::as_str), Some("v"));
    assert_eq!(tasks[0].body, Some(json!({"a": 1})));
}

#[tokio::test]
async fn delay_swallows_backend_failures() {
    let provider = Arc::new(RecordingDelayer {
        fail_enqueue: true,
        ..Default::default()
    });
    let binder = DelayedBinder::new("https://svc.example.com", provider.clone());
    let endpoint = binder.bind("/tasks/refresh", &[Method::POST]).await.unwrap();

    // Fire-and-forget: the failure is logged, the caller sees nothing.
    endpoint.delay(DelayOptions::default()).await;
    assert_eq!(provider.tasks.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn schedule_verbs_inject_bound_url_and_method() {
    let provider = Arc::new(RecordingScheduler::default());
    let binder = ScheduleBinder::new("https://svc.example.com", provider.clone());
    let endpoint = binder
        .bind("/reports/daily", &[Method::GET])
        .await
        .unwrap();

    endpoint
        .schedule(ScheduleJob::named("daily", "0 8 * * *"))
        .await
        .unwrap();
    {
        let jobs = provider.jobs.lock().unwrap();
        assert_eq!(jobs[0].endpoint_url, "https://svc.example.com/reports/daily");
        assert_eq!(jobs[0].http_method, Method::GET);
    }

    endpoint
        .update_schedule(ScheduleJobUpdate::new("daily", "0 9 * * *"))
        .await
        .unwrap();
    {
        let updates = provider.updates.lock().unwrap();
        assert_eq!(updates[0].endpoint_url, "https://svc.example.com/reports/daily");
        assert_eq!(updates[0].http_method, Method::GET);
    }

    endpoint.delete_schedule("daily").await.unwrap();
    assert_eq!(
        provider.deletes.lock().unwrap().clone(),
        vec!["daily".to_string()]
    );
}

#[tokio::test]
async fn schedule_failures_propagate() {
    let provider = Arc::new(RecordingScheduler {
        fail_upsert: true,
        ..Default::default()
    });
    let binder = ScheduleBinder::new("https://svc.example.com", provider);
    let endpoint = binder.bind("/reports/daily", &[Method::POST]).await.unwrap();

    let error = endpoint
        .schedule(ScheduleJob::named("daily", "0 8 * * *"))
        .await
        .unwrap_err();
    assert_eq!(error.status(), Some(500));
}

#[tokio::test]
async fn endpoints_are_usable_from_anywhere() {
    let provider = Arc::new(RecordingDelayer::default());
    let binder = DelayedBinder::new("https://svc.example.com", provider.clone());
    let endpoint = binder.bind("/tasks/refresh", &[Method::POST]).await.unwrap();

    // Clones share the bound route; any holder can trigger it.
    let clone = endpoint.clone();
    let handle = tokio::spawn(async move {
        clone.delay(DelayOptions::default()).await;
    });
    handle.await.unwrap();
    endpoint.delay(DelayOptions::default()).await;

    assert_eq!(provider.tasks.lock().unwrap().len(), 2);
}
