//! Host-Python embedded runtime.
//!
//! Acquisition checks that the configured interpreter starts. Packages are
//! installed with `pip` (bundled packages are probed with `import` first).
//! The capability is a long-lived bridge process that speaks
//! line-delimited JSON over stdin/stdout and keeps the unit-of-work objects
//! alive between calls.
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use simulator_core::{BaselineConfiguration, OperationLog, SimulatorId};

use super::{EmbeddedCapability, Interpreter, PackageOrigin, PackageSpec, RuntimeSource, UnitOfWork};
use crate::error::{EmbeddedError, RuntimeSourceError};

const BRIDGE_SCRIPT: &str = r#"
import importlib
import json
import sys

module = importlib.import_module(sys.argv[1])
units = {}


def encode(value):
    if hasattr(value, "model_dump"):
        return value.model_dump(mode="json")
    if hasattr(value, "to_py"):
        return value.to_py()
    raise TypeError(f"cannot encode {type(value).__name__}")


def reply(payload):
    sys.stdout.write(json.dumps(payload, default=encode) + "\n")
    sys.stdout.flush()


def dispatch(request):
    call = request["call"]
    if call == "createUow":
        token = len(units) + 1
        units[token] = module.createUow()
        return token
    uow = units[request["uow"]]
    if call == "createSimulatorFromBaseline":
        return module.createSimulatorFromBaseline(request["configuration"], uow)
    if call == "runSimulatorWithPlan":
        return module.runSimulatorWithPlan(request["simulator_id"], request["plan"], uow)
    raise ValueError(f"unknown call {call}")


reply({"ready": True})
for line in sys.stdin:
    if not line.strip():
        continue
    request_id = None
    try:
        request = json.loads(line)
        request_id = request.get("id")
        reply({"id": request_id, "ok": dispatch(request)})
    except Exception as exc:
        reply({"id": request_id, "error": f"{type(exc).__name__}: {exc}"})
"#;

/// Host interpreter settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PythonConfig {
    /// Interpreter executable.
    pub interpreter: PathBuf,
    /// Module exposing `createUow`, `createSimulatorFromBaseline` and
    /// `runSimulatorWithPlan`.
    pub bridge_module: String,
    /// Alternative package index passed to `pip --index-url`.
    pub package_index: Option<String>,
    /// Extra import path for the bridge process (`PYTHONPATH`).
    pub module_path: Option<PathBuf>,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from("python3"),
            bridge_module: "simaple.app.wasm".to_string(),
            package_index: None,
            module_path: None,
        }
    }
}

/// [`RuntimeSource`] backed by a host Python installation.
#[derive(Clone, Debug, Default)]
pub struct PythonRuntimeSource {
    config: PythonConfig,
}

impl PythonRuntimeSource {
    pub fn new(config: PythonConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RuntimeSource for PythonRuntimeSource {
    async fn acquire(&self) -> Result<Box<dyn Interpreter>, RuntimeSourceError> {
        let version = run_python(
            &self.config.interpreter,
            &["-c", "import sys; print(sys.version.split()[0])"],
        )
        .await?;

        tracing::info!(
            "Acquired Python {} at {}",
            version.trim(),
            self.config.interpreter.display()
        );

        Ok(Box::new(PythonInterpreter {
            config: self.config.clone(),
        }))
    }
}

struct PythonInterpreter {
    config: PythonConfig,
}

#[async_trait]
impl Interpreter for PythonInterpreter {
    async fn install_package(&mut self, package: &PackageSpec) -> Result<(), RuntimeSourceError> {
        if package.origin == PackageOrigin::Bundled {
            let probe = format!("import {}", package.name);
            if run_python(&self.config.interpreter, &["-c", probe.as_str()])
                .await
                .is_ok()
            {
                tracing::debug!("Package {} already available", package.name);
                return Ok(());
            }
        }

        let mut args = vec!["-m", "pip", "install", "--quiet"];
        if !package.with_dependencies {
            args.push("--no-deps");
        }
        if let Some(index) = &self.config.package_index {
            args.push("--index-url");
            args.push(index.as_str());
        }
        args.push(package.name.as_str());

        run_python(&self.config.interpreter, &args).await?;
        Ok(())
    }

    async fn resolve_capability(
        &mut self,
    ) -> Result<Arc<dyn EmbeddedCapability>, RuntimeSourceError> {
        let bridge = Bridge::spawn(&self.config).await?;
        Ok(Arc::new(PythonCapability {
            bridge: Mutex::new(bridge),
        }))
    }
}

/// Run the interpreter to completion and return its stdout.
async fn run_python(interpreter: &Path, args: &[&str]) -> Result<String, RuntimeSourceError> {
    let program = interpreter.display().to_string();
    let output = Command::new(interpreter)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| RuntimeSourceError::Spawn {
            program: program.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(RuntimeSourceError::CommandFailed {
            command: format!("{} {}", program, args.join(" ")),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[derive(Serialize)]
#[serde(tag = "call")]
enum BridgeRequest<'a> {
    #[serde(rename = "createUow")]
    CreateUow,
    #[serde(rename = "createSimulatorFromBaseline")]
    CreateSimulator {
        configuration: &'a BaselineConfiguration,
        uow: u64,
    },
    #[serde(rename = "runSimulatorWithPlan")]
    RunSimulator {
        simulator_id: &'a SimulatorId,
        plan: &'a str,
        uow: u64,
    },
}

impl BridgeRequest<'_> {
    fn entry(&self) -> &'static str {
        match self {
            BridgeRequest::CreateUow => "createUow",
            BridgeRequest::CreateSimulator { .. } => "createSimulatorFromBaseline",
            BridgeRequest::RunSimulator { .. } => "runSimulatorWithPlan",
        }
    }
}

/// A request tagged with the id its reply must echo.
#[derive(Serialize)]
struct Envelope<'a> {
    id: u64,
    #[serde(flatten)]
    request: &'a BridgeRequest<'a>,
}

#[derive(Deserialize)]
struct BridgeReply {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    ok: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

struct Bridge {
    // Held so the process is killed when the capability is dropped.
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    last_id: u64,
    // Set while a request line is being written; still set on the next call
    // if that write was cancelled part-way.
    partial_write: bool,
}

impl Bridge {
    async fn spawn(config: &PythonConfig) -> Result<Self, RuntimeSourceError> {
        let mut command = Command::new(&config.interpreter);
        if let Some(path) = &config.module_path {
            command.env("PYTHONPATH", path);
        }
        let mut child = command
            .args(["-u", "-c", BRIDGE_SCRIPT, config.bridge_module.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RuntimeSourceError::Spawn {
                program: config.interpreter.display().to_string(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RuntimeSourceError::Handshake("bridge stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RuntimeSourceError::Handshake("bridge stdout unavailable".into()))?;
        let mut stdout = BufReader::new(stdout).lines();

        let line = stdout.next_line().await?.ok_or_else(|| {
            RuntimeSourceError::Handshake(format!(
                "bridge exited before importing {}",
                config.bridge_module
            ))
        })?;
        let greeting: BridgeReply = serde_json::from_str(&line)
            .map_err(|e| RuntimeSourceError::Handshake(e.to_string()))?;
        if !greeting.ready {
            return Err(RuntimeSourceError::Handshake(line));
        }

        tracing::debug!("Bridge ready for module {}", config.bridge_module);

        Ok(Self {
            _child: child,
            stdin,
            stdout,
            last_id: 0,
            partial_write: false,
        })
    }

    /// Send one request and wait for the reply carrying its id.
    ///
    /// Replies to earlier requests whose callers gave up are discarded, so a
    /// cancelled call never hands its answer to the next one.
    async fn call(&mut self, request: &BridgeRequest<'_>) -> Result<Value, EmbeddedError> {
        let entry = request.entry();
        self.last_id += 1;
        let id = self.last_id;

        let mut line = serde_json::to_string(&Envelope { id, request })?;
        line.push('\n');

        if self.partial_write {
            // Terminate the fragment; the bridge answers it with an error
            // that carries no id.
            self.stdin.write_all(b"\n").await?;
        }
        self.partial_write = true;
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        self.partial_write = false;

        loop {
            let reply = self
                .stdout
                .next_line()
                .await?
                .ok_or(EmbeddedError::BridgeClosed { entry })?;
            let reply: BridgeReply = serde_json::from_str(&reply)?;

            if reply.id != Some(id) {
                tracing::debug!("Discarding stale bridge reply {:?} (waiting for {})", reply.id, id);
                continue;
            }

            return match reply.error {
                Some(message) => Err(EmbeddedError::Raised { entry, message }),
                None => Ok(reply.ok.unwrap_or(Value::Null)),
            };
        }
    }
}

struct PythonCapability {
    // One request in flight at a time; replies are matched by id.
    bridge: Mutex<Bridge>,
}

#[async_trait]
impl EmbeddedCapability for PythonCapability {
    async fn create_unit_of_work(&self) -> Result<UnitOfWork, EmbeddedError> {
        let token = self
            .bridge
            .lock()
            .await
            .call(&BridgeRequest::CreateUow)
            .await?;
        Ok(UnitOfWork::new(serde_json::from_value(token)?))
    }

    async fn create_simulator_from_configuration(
        &self,
        configuration: &BaselineConfiguration,
        uow: &UnitOfWork,
    ) -> Result<SimulatorId, EmbeddedError> {
        let request = BridgeRequest::CreateSimulator {
            configuration,
            uow: uow.token(),
        };
        let id = self.bridge.lock().await.call(&request).await?;
        Ok(serde_json::from_value(id)?)
    }

    async fn run_simulator_with_plan(
        &self,
        id: &SimulatorId,
        plan: &str,
        uow: &UnitOfWork,
    ) -> Result<Vec<OperationLog>, EmbeddedError> {
        let request = BridgeRequest::RunSimulator {
            simulator_id: id,
            plan,
            uow: uow.token(),
        };
        let logs = self.bridge.lock().await.call(&request).await?;
        Ok(serde_json::from_value(logs)?)
    }
}
