use std::{
    future::IntoFuture,
    io::ErrorKind,
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, OnceLock},
    time::{Duration, Instant},
};

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use serde::Serialize;
use tokio::{
    net::TcpListener,
    sync::{mpsc, Mutex},
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use zone_common::{
    apply_actions, Actuator, EngineAction, HumiditySource, InputEvent, RuntimeConfig,
    TemperatureSource, ZoneEngine, TOPIC_CMD_DOOR, TOPIC_CMD_MOTION, TOPIC_CMD_SETPOINT,
    TOPIC_CONTROLLER_STATE, TOPIC_SENSOR_HUMIDITY,
};

use crate::adapters::{ConsoleDisplay, HumidityCache, LoggingActuators, SimulatedDht};

const MAX_MQTT_PAYLOAD_BYTES: usize = 512;
const INPUT_QUEUE_DEPTH: usize = 64;

/// Engine plus the hardware it drives, so actions are applied in the same
/// lock scope that produced them.
struct Zone {
    engine: ZoneEngine,
    actuators: LoggingActuators,
    display: ConsoleDisplay,
}

impl Zone {
    fn apply(&mut self, actions: &[EngineAction]) {
        apply_actions(actions, &mut self.actuators, &mut self.display);
    }
}

#[derive(Clone)]
struct AppState {
    zone: Arc<Mutex<Zone>>,
    inputs: mpsc::Sender<InputEvent>,
    humidity: HumidityCache,
    mqtt: AsyncClient,
}

impl AppState {
    fn new(
        engine: ZoneEngine,
        inputs: mpsc::Sender<InputEvent>,
        humidity: HumidityCache,
        mqtt: AsyncClient,
    ) -> Self {
        Self {
            zone: Arc::new(Mutex::new(Zone {
                engine,
                actuators: LoggingActuators::default(),
                display: ConsoleDisplay::default(),
            })),
            inputs,
            humidity,
            mqtt,
        }
    }

    /// Runs one read-modify-write on the engine and applies its actions
    /// before the lock is released. `now_ms` is sampled under the lock so
    /// writers never apply an older timestamp after a newer one.
    async fn with_zone<F>(&self, update: F)
    where
        F: FnOnce(&mut ZoneEngine, u64) -> Vec<EngineAction>,
    {
        let mut zone = self.zone.lock().await;
        let now_ms = monotonic_ms();
        let actions = update(&mut zone.engine, now_ms);
        zone.apply(&actions);
    }
}

struct ConfigStore {
    runtime_path: PathBuf,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct AcceptedBody {
    queued: InputEvent,
}

#[derive(Debug, Serialize)]
struct HardwareView {
    #[serde(rename = "heatIndicator")]
    heat_indicator: bool,
    #[serde(rename = "coolIndicator")]
    cool_indicator: bool,
    #[serde(rename = "ambientLight")]
    ambient_light: bool,
    alarm: bool,
    display: [String; 2],
}

#[derive(Debug, Serialize)]
struct TimeStatus {
    #[serde(rename = "nowEpoch")]
    now_epoch: i64,
    #[serde(rename = "uptimeMs")]
    uptime_ms: u64,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = ConfigStore::new();
    let runtime = store.load_runtime_config().await.unwrap_or_else(|err| {
        warn!("failed to load runtime config from store: {err:#}");
        RuntimeConfig::default()
    });

    let engine = ZoneEngine::new(
        runtime.zone.clone(),
        runtime.setpoint.clone(),
        monotonic_ms(),
    );
    let humidity = HumidityCache::new(engine.config.humidity_stale_timeout_ms);

    let mqtt_host = std::env::var("MQTT_HOST").unwrap_or(runtime.network.mqtt_host.clone());
    let mqtt_port = std::env::var("MQTT_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(runtime.network.mqtt_port);

    let mut mqtt_options = MqttOptions::new("zone-controller-rust", mqtt_host, mqtt_port);
    let mqtt_user = std::env::var("MQTT_USER").unwrap_or(runtime.network.mqtt_user.clone());
    let mqtt_pass = std::env::var("MQTT_PASS").unwrap_or(runtime.network.mqtt_pass.clone());
    if !mqtt_user.is_empty() {
        mqtt_options.set_credentials(mqtt_user, mqtt_pass);
    }

    let (mqtt, eventloop) = AsyncClient::new(mqtt_options, 64);
    let (inputs, input_rx) = mpsc::channel(INPUT_QUEUE_DEPTH);

    let app_state = AppState::new(engine, inputs, humidity.clone(), mqtt);

    subscribe_topics(&app_state.mqtt).await?;
    spawn_mqtt_loop(app_state.clone(), eventloop);
    spawn_input_loop(app_state.clone(), input_rx);
    spawn_motion_loop(app_state.clone());
    spawn_alarm_loop(app_state.clone());
    spawn_humidity_loop(app_state.clone(), humidity);
    spawn_state_publish_loop(app_state.clone());
    let control = tokio::spawn(run_control_loop(app_state.clone(), SimulatedDht::from_env()));

    let app = Router::new()
        .route("/api/status", get(handle_get_status))
        .route("/api/hardware", get(handle_get_hardware))
        .route("/api/setpoint/up", post(handle_setpoint_up))
        .route("/api/setpoint/down", post(handle_setpoint_down))
        .route("/api/door/toggle", post(handle_door_toggle))
        .route("/api/motion", post(handle_motion))
        .route("/api/time", get(handle_get_time))
        .with_state(app_state);

    let port = std::env::var("ZONE_HTTP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(runtime.network.http_port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind controller server at {addr}"))?;

    info!("controller listening on http://{addr}");
    tokio::select! {
        joined = control => joined.context("control loop task aborted")?,
        served = axum::serve(listener, app).into_future() => served.context("http server failed"),
    }
}

/// Main decision tick: sensor read, smoothing, comfort index, HVAC,
/// emergency and display. Returns only on a fatal sensor fault.
async fn run_control_loop<S>(app_state: AppState, mut sensor: S) -> anyhow::Result<()>
where
    S: TemperatureSource + Send + 'static,
{
    let (tick_ms, backoff_ms) = {
        let zone = app_state.zone.lock().await;
        (
            zone.engine.config.main_tick_ms,
            zone.engine.config.sensor_retry_backoff_ms,
        )
    };

    let mut interval = tokio::time::interval(Duration::from_millis(tick_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let reading = match sensor.read() {
            Ok(reading) => reading,
            Err(err) if err.is_transient() => {
                warn!("{err}; retrying in {backoff_ms}ms");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                continue;
            }
            Err(err) => {
                sensor.release();
                return Err(anyhow::Error::new(err).context("temperature sensor failed"));
            }
        };

        app_state
            .with_zone(|engine, now_ms| {
                match reading {
                    Some(celsius) => engine.record_temperature_c(celsius, now_ms),
                    None => debug!("sensor returned no temperature"),
                }
                engine.tick(now_ms)
            })
            .await;
    }
}

async fn subscribe_topics(mqtt: &AsyncClient) -> anyhow::Result<()> {
    let topics = [
        TOPIC_SENSOR_HUMIDITY,
        TOPIC_CMD_SETPOINT,
        TOPIC_CMD_DOOR,
        TOPIC_CMD_MOTION,
    ];

    for topic in topics {
        mqtt.subscribe(topic, QoS::AtLeastOnce).await?;
    }
    Ok(())
}

fn spawn_mqtt_loop(app_state: AppState, mut eventloop: rumqttc::EventLoop) {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::Publish(message))) => {
                    if let Err(err) =
                        handle_mqtt_message(&app_state, &message.topic, &message.payload).await
                    {
                        warn!("mqtt message handling error: {err:#}");
                    }
                }
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("mqtt connected");
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("mqtt poll error: {err}");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}

/// Drains button and motion events in arrival order.
fn spawn_input_loop(app_state: AppState, mut inputs: mpsc::Receiver<InputEvent>) {
    tokio::spawn(async move {
        while let Some(event) = inputs.recv().await {
            debug!("input event: {event:?}");
            app_state
                .with_zone(|engine, now_ms| engine.handle_input(event, now_ms))
                .await;
        }
        warn!("input channel closed");
    });
}

fn spawn_motion_loop(app_state: AppState) {
    tokio::spawn(async move {
        let poll_ms = { app_state.zone.lock().await.engine.config.motion_poll_ms };
        let mut interval = tokio::time::interval(Duration::from_millis(poll_ms));

        loop {
            interval.tick().await;
            app_state
                .with_zone(|engine, now_ms| engine.poll_motion(now_ms))
                .await;
        }
    });
}

fn spawn_alarm_loop(app_state: AppState) {
    tokio::spawn(async move {
        loop {
            let next_ms = {
                let mut zone = app_state.zone.lock().await;
                let now_ms = monotonic_ms();
                let actions = zone.engine.alarm_tick(now_ms);
                zone.apply(&actions);
                zone.engine.alarm_interval_ms()
            };
            tokio::time::sleep(Duration::from_millis(next_ms)).await;
        }
    });
}

/// Fresh values reach the engine on arrival; this loop only clears the
/// engine's copy once the cached value goes stale.
fn spawn_humidity_loop(app_state: AppState, mut source: impl HumiditySource + Send + 'static) {
    tokio::spawn(async move {
        let refresh_ms = { app_state.zone.lock().await.engine.config.humidity_refresh_ms };
        let mut interval = tokio::time::interval(Duration::from_millis(refresh_ms));

        loop {
            interval.tick().await;
            let humidity = source.fetch_latest(monotonic_ms());
            if humidity.is_none() {
                debug!("humidity unavailable; comfort index uses temperature only");
            }
            app_state
                .with_zone(|engine, _| {
                    engine.set_humidity(humidity);
                    Vec::new()
                })
                .await;
        }
    });
}

fn spawn_state_publish_loop(app_state: AppState) {
    tokio::spawn(async move {
        let publish_ms = {
            app_state
                .zone
                .lock()
                .await
                .engine
                .config
                .state_publish_interval_ms
        };
        let mut interval = tokio::time::interval(Duration::from_millis(publish_ms));

        loop {
            interval.tick().await;

            let now_ms = monotonic_ms();
            let payload = {
                let zone = app_state.zone.lock().await;
                serde_json::to_vec(&zone.engine.status(now_ms))
            };

            match payload {
                Ok(body) => {
                    if let Err(err) = app_state
                        .mqtt
                        .publish(TOPIC_CONTROLLER_STATE, QoS::AtLeastOnce, true, body)
                        .await
                    {
                        warn!("controller state publish failed: {err}");
                    }
                }
                Err(err) => warn!("controller state serialization failed: {err}"),
            }
        }
    });
}

async fn handle_mqtt_message(
    app_state: &AppState,
    topic: &str,
    payload: &[u8],
) -> anyhow::Result<()> {
    if payload.len() > MAX_MQTT_PAYLOAD_BYTES {
        warn!(
            "dropping oversized MQTT payload on topic {} ({} bytes)",
            topic,
            payload.len()
        );
        return Ok(());
    }

    let message = std::str::from_utf8(payload).context("non utf8 mqtt payload")?;

    if topic == TOPIC_SENSOR_HUMIDITY {
        match parse_humidity(message) {
            Some(percent) => {
                app_state.humidity.update(percent, monotonic_ms());
                app_state
                    .with_zone(|engine, _| {
                        engine.set_humidity(Some(percent));
                        Vec::new()
                    })
                    .await;
            }
            None => debug!("ignoring humidity payload {message:?}"),
        }
        return Ok(());
    }

    match parse_command(topic, message) {
        Some(event) => app_state
            .inputs
            .send(event)
            .await
            .context("input channel closed")?,
        None => debug!("ignoring command {message:?} on {topic}"),
    }
    Ok(())
}

fn parse_humidity(message: &str) -> Option<u8> {
    let value = message.trim().parse::<f32>().ok()?;
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return None;
    }
    Some(value.round() as u8)
}

fn parse_command(topic: &str, message: &str) -> Option<InputEvent> {
    let lower = message.trim().to_ascii_lowercase();
    match topic {
        TOPIC_CMD_SETPOINT => match lower.as_str() {
            "up" | "inc" | "+" => Some(InputEvent::TemperatureIncrement),
            "down" | "dec" | "-" => Some(InputEvent::TemperatureDecrement),
            _ => None,
        },
        TOPIC_CMD_DOOR if lower == "toggle" => Some(InputEvent::DoorToggle),
        TOPIC_CMD_MOTION => Some(InputEvent::MotionDetected),
        _ => None,
    }
}

async fn handle_get_status(State(state): State<AppState>) -> impl IntoResponse {
    let now_ms = monotonic_ms();
    let status = {
        let zone = state.zone.lock().await;
        zone.engine.status(now_ms)
    };
    Json(status)
}

async fn handle_get_hardware(State(state): State<AppState>) -> impl IntoResponse {
    let zone = state.zone.lock().await;
    Json(HardwareView {
        heat_indicator: zone.actuators.level(Actuator::HeatIndicator),
        cool_indicator: zone.actuators.level(Actuator::CoolIndicator),
        ambient_light: zone.actuators.level(Actuator::AmbientLight),
        alarm: zone.actuators.level(Actuator::Alarm),
        display: zone.display.lines().clone(),
    })
}

async fn handle_setpoint_up(State(state): State<AppState>) -> axum::response::Response {
    enqueue_input(&state, InputEvent::TemperatureIncrement).await
}

async fn handle_setpoint_down(State(state): State<AppState>) -> axum::response::Response {
    enqueue_input(&state, InputEvent::TemperatureDecrement).await
}

async fn handle_door_toggle(State(state): State<AppState>) -> axum::response::Response {
    enqueue_input(&state, InputEvent::DoorToggle).await
}

async fn handle_motion(State(state): State<AppState>) -> axum::response::Response {
    enqueue_input(&state, InputEvent::MotionDetected).await
}

async fn enqueue_input(state: &AppState, event: InputEvent) -> axum::response::Response {
    if let Err(err) = state.inputs.send(event).await {
        warn!("failed to queue input event: {err}");
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "Input queue unavailable");
    }
    (StatusCode::ACCEPTED, Json(AcceptedBody { queued: event })).into_response()
}

async fn handle_get_time() -> impl IntoResponse {
    Json(TimeStatus {
        now_epoch: Utc::now().timestamp(),
        uptime_ms: monotonic_ms(),
    })
}

impl ConfigStore {
    fn new() -> Self {
        let data_dir = std::env::var("ZONE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.zone"));

        Self {
            runtime_path: data_dir.join("runtime.json"),
        }
    }

    async fn load_runtime_config(&self) -> anyhow::Result<RuntimeConfig> {
        match tokio::fs::read(&self.runtime_path).await {
            Ok(raw) => RuntimeConfig::from_json_slice(&raw).with_context(|| {
                format!("invalid runtime config {}", self.runtime_path.display())
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
            Err(err) => Err(err.into()),
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::atomic::{AtomicBool, AtomicU64, Ordering},
    };

    use zone_common::{SensorError, SetpointSettings, ZoneConfig};

    use super::*;

    struct ScriptedSensor {
        readings: VecDeque<Result<Option<f32>, SensorError>>,
        released: Arc<AtomicBool>,
    }

    impl TemperatureSource for ScriptedSensor {
        fn read(&mut self) -> Result<Option<f32>, SensorError> {
            self.readings
                .pop_front()
                .unwrap_or_else(|| Err(SensorError::Fatal("script exhausted".to_string())))
        }

        fn release(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    fn test_state(config: ZoneConfig) -> (AppState, mpsc::Receiver<InputEvent>) {
        let engine = ZoneEngine::new(config, SetpointSettings::default(), monotonic_ms());
        let (mqtt, _eventloop) =
            AsyncClient::new(MqttOptions::new("zone-controller-test", "127.0.0.1", 1883), 8);
        let (inputs, input_rx) = mpsc::channel(INPUT_QUEUE_DEPTH);
        let humidity = HumidityCache::new(engine.config.humidity_stale_timeout_ms);
        (AppState::new(engine, inputs, humidity, mqtt), input_rx)
    }

    #[test]
    fn humidity_payloads() {
        assert_eq!(parse_humidity("42"), Some(42));
        assert_eq!(parse_humidity(" 55.6\n"), Some(56));
        assert_eq!(parse_humidity("101"), None);
        assert_eq!(parse_humidity("-3"), None);
        assert_eq!(parse_humidity("NaN"), None);
        assert_eq!(parse_humidity("humid"), None);
    }

    #[test]
    fn command_payloads() {
        assert_eq!(
            parse_command(TOPIC_CMD_SETPOINT, "UP"),
            Some(InputEvent::TemperatureIncrement)
        );
        assert_eq!(
            parse_command(TOPIC_CMD_SETPOINT, "down"),
            Some(InputEvent::TemperatureDecrement)
        );
        assert_eq!(parse_command(TOPIC_CMD_SETPOINT, "sideways"), None);
        assert_eq!(
            parse_command(TOPIC_CMD_DOOR, "toggle"),
            Some(InputEvent::DoorToggle)
        );
        assert_eq!(parse_command(TOPIC_CMD_DOOR, "open"), None);
        assert_eq!(
            parse_command(TOPIC_CMD_MOTION, ""),
            Some(InputEvent::MotionDetected)
        );
        assert_eq!(parse_command("zone/unknown", "up"), None);
    }

    #[tokio::test]
    async fn missing_config_file_yields_defaults() {
        let store = ConfigStore {
            runtime_path: PathBuf::from("./does-not-exist/runtime.json"),
        };
        let runtime = store.load_runtime_config().await.unwrap();
        assert_eq!(runtime.zone.main_tick_ms, 500);
        assert_eq!(runtime.setpoint.desired_f, 70);
    }

    #[tokio::test]
    async fn control_loop_skips_faults_and_gaps_then_stops_on_fatal() {
        let (state, _input_rx) = test_state(ZoneConfig {
            main_tick_ms: 5,
            sensor_retry_backoff_ms: 5,
            ..ZoneConfig::default()
        });
        let released = Arc::new(AtomicBool::new(false));
        let sensor = ScriptedSensor {
            readings: VecDeque::from([
                Ok(Some(21.0)),
                Err(SensorError::Transient("checksum".to_string())),
                Ok(None),
                Ok(Some(22.0)),
                Err(SensorError::Fatal("gpio lost".to_string())),
            ]),
            released: released.clone(),
        };

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            run_control_loop(state.clone(), sensor),
        )
        .await
        .expect("control loop should stop on the fatal reading");

        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("temperature sensor failed"));
        assert!(released.load(Ordering::SeqCst));

        // 21 C -> 69 F, 22 C -> 71 F; the transient fault and the gap add nothing.
        let zone = state.zone.lock().await;
        assert_eq!(zone.engine.smoothed_temp_f(), Some(70));
    }

    #[tokio::test]
    async fn with_zone_stamps_time_after_acquiring_lock() {
        let (state, _input_rx) = test_state(ZoneConfig::default());
        let stamped = Arc::new(AtomicU64::new(0));

        let guard = state.zone.lock().await;
        let writer = {
            let state = state.clone();
            let stamped = stamped.clone();
            tokio::spawn(async move {
                state
                    .with_zone(|_, now_ms| {
                        stamped.store(now_ms, Ordering::SeqCst);
                        Vec::new()
                    })
                    .await;
            })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        let unlocked_at = monotonic_ms();
        drop(guard);
        writer.await.unwrap();

        assert!(stamped.load(Ordering::SeqCst) >= unlocked_at);
    }

    #[tokio::test]
    async fn humidity_message_reaches_engine_immediately() {
        let (state, _input_rx) = test_state(ZoneConfig::default());

        handle_mqtt_message(&state, TOPIC_SENSOR_HUMIDITY, b"48")
            .await
            .unwrap();
        assert_eq!(state.zone.lock().await.engine.humidity(), Some(48));

        handle_mqtt_message(&state, TOPIC_SENSOR_HUMIDITY, b"soggy")
            .await
            .unwrap();
        assert_eq!(state.zone.lock().await.engine.humidity(), Some(48));
    }

    #[tokio::test]
    async fn command_messages_are_queued_in_order() {
        let (state, mut input_rx) = test_state(ZoneConfig::default());

        handle_mqtt_message(&state, TOPIC_CMD_DOOR, b"toggle")
            .await
            .unwrap();
        handle_mqtt_message(&state, TOPIC_CMD_SETPOINT, b"up")
            .await
            .unwrap();

        assert_eq!(input_rx.recv().await, Some(InputEvent::DoorToggle));
        assert_eq!(input_rx.recv().await, Some(InputEvent::TemperatureIncrement));
    }
}
