use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{address, keccak256, Address, Bytes};
use serde_json::Value;

use casefile_core::{AccountsListener, ListenerId, PortError, WalletProviderPort};

use crate::WalletAdapterConfig;

#[cfg(target_arch = "wasm32")]
const ACCOUNTS_CHANGED: &str = "accountsChanged";
/// EIP-1193 "unauthorized": the requested account has not been authorized.
const UNAUTHORIZED_CODE: i64 = 4100;

#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    #[cfg(not(target_arch = "wasm32"))]
    Proxy(ProxyRuntime),
    #[cfg(target_arch = "wasm32")]
    Browser,
}

#[derive(Debug, Clone)]
#[cfg(not(target_arch = "wasm32"))]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::Client,
}

struct ProviderState {
    accounts: Vec<Address>,
    authorized: bool,
    reject_requests: bool,
    next_listener: u64,
    listeners: Vec<(ListenerId, AccountsListener)>,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            accounts: vec![address!("1000000000000000000000000000000000000001")],
            authorized: false,
            reject_requests: false,
            next_listener: 0,
            listeners: Vec::new(),
        }
    }
}

impl fmt::Debug for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderState")
            .field("accounts", &self.accounts)
            .field("authorized", &self.authorized)
            .field("reject_requests", &self.reject_requests)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(target_arch = "wasm32")]
thread_local! {
    // JS closures handed to provider.on(...); kept so removeListener receives
    // the same function reference.
    static BROWSER_HOOKS: std::cell::RefCell<
        std::collections::HashMap<
            ListenerId,
            wasm_bindgen::closure::Closure<dyn FnMut(wasm_bindgen::JsValue)>,
        >,
    > = std::cell::RefCell::new(std::collections::HashMap::new());
}

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::with_config(WalletAdapterConfig::from_env())
    }
}

impl Eip1193Adapter {
    pub fn with_config(config: WalletAdapterConfig) -> Self {
        let mode = if config.provider_absent {
            ProviderMode::Disabled("wallet extension disabled by configuration".to_owned())
        } else {
            Self::runtime_mode(&config)
        };
        tracing::info!(?mode, "eip1193 adapter initialized");
        Self {
            mode,
            state: Arc::new(Mutex::new(ProviderState::default())),
        }
    }

    /// In-memory provider with a single built-in account.
    pub fn deterministic() -> Self {
        Self {
            mode: ProviderMode::Deterministic,
            state: Arc::new(Mutex::new(ProviderState::default())),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn runtime_mode(_config: &WalletAdapterConfig) -> ProviderMode {
        // The extension may inject window.ethereum after startup, so presence
        // is checked per request.
        ProviderMode::Browser
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn runtime_mode(config: &WalletAdapterConfig) -> ProviderMode {
        if let Some(ref base_url) = config.eip1193_proxy_url {
            let timeout = std::time::Duration::from_millis(config.provider_timeout_ms);
            match reqwest::Client::builder().timeout(timeout).build() {
                Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                }),
                Err(e) => ProviderMode::Disabled(format!(
                    "failed to initialize EIP-1193 proxy client: {e}"
                )),
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "EIP-1193 proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        }
    }

    pub fn is_available(&self) -> bool {
        match &self.mode {
            ProviderMode::Disabled(_) => false,
            #[cfg(target_arch = "wasm32")]
            ProviderMode::Browser => browser_provider().is_ok(),
            _ => true,
        }
    }

    /// True when backed by the in-memory provider rather than a real wallet.
    pub fn is_deterministic(&self) -> bool {
        matches!(self.mode, ProviderMode::Deterministic)
    }

    pub fn listener_count(&self) -> Result<usize, PortError> {
        Ok(self.lock()?.listeners.len())
    }

    /// Replace the deterministic account list and fire `accountsChanged`.
    pub fn debug_inject_accounts_changed(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        {
            let mut g = self.lock()?;
            g.accounts = accounts.clone();
        }
        self.emit_accounts_changed(&accounts)
    }

    /// Make the deterministic provider decline account and signature prompts.
    pub fn debug_set_reject_requests(&self, reject: bool) -> Result<(), PortError> {
        self.lock()?.reject_requests = reject;
        Ok(())
    }

    fn emit_accounts_changed(&self, accounts: &[Address]) -> Result<(), PortError> {
        let listeners: Vec<AccountsListener> = self
            .lock()?
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        tracing::debug!(count = listeners.len(), "dispatching accountsChanged");
        for listener in listeners {
            listener(accounts);
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ProviderState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
    }

    fn deterministic_signature(&self, message: &str, signer: Address) -> Bytes {
        let mut seed = Vec::new();
        seed.extend_from_slice(b"personal_sign");
        seed.extend_from_slice(signer.as_slice());
        seed.extend_from_slice(message.as_bytes());
        let hash = keccak256(seed);
        let mut sig = Vec::with_capacity(65);
        sig.extend_from_slice(hash.as_slice());
        sig.extend_from_slice(hash.as_slice());
        sig.push(27);
        Bytes::from(sig)
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, PortError> {
        tracing::debug!(method, "eip1193 request");
        match &self.mode {
            ProviderMode::Disabled(reason) => Err(PortError::NotFound(reason.clone())),
            ProviderMode::Deterministic => Err(PortError::NotImplemented(
                "deterministic provider has no rpc transport",
            )),
            #[cfg(not(target_arch = "wasm32"))]
            ProviderMode::Proxy(proxy) => proxy_call(proxy, method, params).await,
            #[cfg(target_arch = "wasm32")]
            ProviderMode::Browser => wasm_request(method, params).await,
        }
    }
}

impl WalletProviderPort for Eip1193Adapter {
    async fn authorized_accounts(&self) -> Result<Vec<Address>, PortError> {
        if let ProviderMode::Deterministic = self.mode {
            let g = self.lock()?;
            return Ok(if g.authorized {
                g.accounts.clone()
            } else {
                Vec::new()
            });
        }
        let result = self.rpc("eth_accounts", serde_json::json!([])).await?;
        parse_accounts(&result, "eth_accounts")
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        if let ProviderMode::Deterministic = self.mode {
            let mut g = self.lock()?;
            if g.reject_requests {
                return Err(PortError::user_rejected("User rejected the request."));
            }
            g.authorized = true;
            return Ok(g.accounts.clone());
        }
        let result = self
            .rpc("eth_requestAccounts", serde_json::json!([]))
            .await?;
        parse_accounts(&result, "eth_requestAccounts")
    }

    async fn personal_sign(&self, message: &str, signer: Address) -> Result<Bytes, PortError> {
        if let ProviderMode::Deterministic = self.mode {
            let g = self.lock()?;
            if g.reject_requests {
                return Err(PortError::user_rejected("User denied message signature."));
            }
            if !g.authorized || !g.accounts.contains(&signer) {
                return Err(PortError::Rejected {
                    code: UNAUTHORIZED_CODE,
                    message: format!("account {signer} has not been authorized"),
                });
            }
            return Ok(self.deterministic_signature(message, signer));
        }
        let payload_hex = format!("0x{}", alloy::hex::encode(message.as_bytes()));
        let result = self
            .rpc(
                "personal_sign",
                serde_json::json!([payload_hex, signer.to_string()]),
            )
            .await?;
        let raw = result.as_str().ok_or_else(|| {
            PortError::Transport("personal_sign response must be hex string".to_owned())
        })?;
        raw.parse()
            .map_err(|e| PortError::Validation(format!("invalid signature hex: {e}")))
    }

    async fn revoke_permissions(&self) -> Result<(), PortError> {
        if let ProviderMode::Deterministic = self.mode {
            self.lock()?.authorized = false;
            return Ok(());
        }
        self.rpc(
            "wallet_revokePermissions",
            serde_json::json!([{ "eth_accounts": {} }]),
        )
        .await?;
        Ok(())
    }

    fn subscribe_accounts_changed(
        &self,
        listener: AccountsListener,
    ) -> Result<ListenerId, PortError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(PortError::NotFound(reason.clone()));
        }
        let id = {
            let mut g = self.lock()?;
            g.next_listener = g.next_listener.saturating_add(1);
            ListenerId(g.next_listener)
        };

        #[cfg(target_arch = "wasm32")]
        if let ProviderMode::Browser = self.mode {
            register_browser_listener(id, Arc::clone(&listener))?;
        }

        self.lock()?.listeners.push((id, listener));
        Ok(id)
    }

    fn unsubscribe(&self, id: ListenerId) -> Result<(), PortError> {
        {
            let mut g = self.lock()?;
            let before = g.listeners.len();
            g.listeners.retain(|(existing, _)| *existing != id);
            if g.listeners.len() == before {
                return Err(PortError::NotFound(format!("listener {id:?} not registered")));
            }
        }

        #[cfg(target_arch = "wasm32")]
        if let ProviderMode::Browser = self.mode {
            remove_browser_listener(id)?;
        }

        Ok(())
    }
}

fn parse_accounts(value: &Value, method: &str) -> Result<Vec<Address>, PortError> {
    let arr = value
        .as_array()
        .ok_or_else(|| PortError::Transport(format!("{method}: array expected")))?;
    let mut accounts = Vec::with_capacity(arr.len());
    for item in arr {
        let raw = item
            .as_str()
            .ok_or_else(|| PortError::Transport(format!("{method}: string expected")))?;
        let parsed: Address = raw
            .parse()
            .map_err(|e| PortError::Validation(format!("invalid account address: {e}")))?;
        accounts.push(parsed);
    }
    Ok(accounts)
}

/// Map an EIP-1193 `{code, message}` error object.
fn rpc_error(err: &Value) -> PortError {
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("provider error")
        .to_owned();
    match err.get("code").and_then(Value::as_i64) {
        Some(code) => PortError::Rejected { code, message },
        None => PortError::Transport(format!("provider returned error: {err}")),
    }
}

#[cfg(not(target_arch = "wasm32"))]
async fn proxy_call(proxy: &ProxyRuntime, method: &str, params: Value) -> Result<Value, PortError> {
    let payload = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    });
    let response = proxy
        .client
        .post(&proxy.base_url)
        .json(&payload)
        .send()
        .await
        .map_err(|e| PortError::Transport(format!("eip1193 proxy request failed: {e}")))?;
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| PortError::Transport(format!("eip1193 proxy json decode failed: {e}")))?;
    if let Some(err) = body.get("error") {
        return Err(rpc_error(err));
    }
    if !status.is_success() {
        return Err(PortError::Transport(format!(
            "eip1193 proxy status {status}: {body}"
        )));
    }
    body.get("result")
        .cloned()
        .ok_or_else(|| PortError::Transport("eip1193 proxy missing result".to_owned()))
}

#[cfg(target_arch = "wasm32")]
async fn wasm_request(method: &str, params: Value) -> Result<Value, PortError> {
    use wasm_bindgen::JsCast;

    let provider = browser_provider()?;
    let request_fn = provider_fn(&provider, &["request"])?;
    let request = serde_json::json!({
        "method": method,
        "params": params,
    });
    let request_js = serde_wasm_bindgen::to_value(&request)
        .map_err(|e| PortError::Transport(format!("failed to encode wasm request: {e}")))?;
    let promise_js = request_fn
        .call1(&provider, &request_js)
        .map_err(|e| PortError::Transport(format!("provider request dispatch failed: {e:?}")))?;
    let promise = promise_js
        .dyn_into::<js_sys::Promise>()
        .map_err(|_| PortError::Transport("provider request did not return Promise".to_owned()))?;
    let result_js = wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(js_rejection)?;
    if result_js.is_null() || result_js.is_undefined() {
        return Ok(Value::Null);
    }
    serde_wasm_bindgen::from_value(result_js)
        .map_err(|e| PortError::Transport(format!("failed to decode wasm response: {e}")))
}

#[cfg(target_arch = "wasm32")]
fn js_rejection(err: wasm_bindgen::JsValue) -> PortError {
    let code = get_prop(&err, "code").ok().and_then(|v| v.as_f64());
    let message = get_prop(&err, "message")
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    match code {
        Some(code) => PortError::Rejected {
            code: code as i64,
            message,
        },
        None => PortError::Transport(format!("provider request rejected: {message}")),
    }
}

#[cfg(target_arch = "wasm32")]
fn register_browser_listener(id: ListenerId, listener: AccountsListener) -> Result<(), PortError> {
    use wasm_bindgen::{closure::Closure, JsCast, JsValue};

    let provider = browser_provider()?;
    let on_fn = provider_fn(&provider, &["on", "addListener"])?;
    let callback = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
        let accounts = js_accounts(&value);
        listener(accounts.as_slice());
    });
    on_fn
        .call2(
            &provider,
            &JsValue::from_str(ACCOUNTS_CHANGED),
            callback.as_ref().unchecked_ref(),
        )
        .map_err(|e| PortError::Transport(format!("register accountsChanged failed: {e:?}")))?;
    BROWSER_HOOKS.with(|hooks| hooks.borrow_mut().insert(id, callback));
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn remove_browser_listener(id: ListenerId) -> Result<(), PortError> {
    use wasm_bindgen::{JsCast, JsValue};

    let Some(callback) = BROWSER_HOOKS.with(|hooks| hooks.borrow_mut().remove(&id)) else {
        return Ok(());
    };
    let provider = browser_provider()?;
    let off_fn = provider_fn(&provider, &["removeListener", "off"])?;
    off_fn
        .call2(
            &provider,
            &JsValue::from_str(ACCOUNTS_CHANGED),
            callback.as_ref().unchecked_ref(),
        )
        .map_err(|e| PortError::Transport(format!("remove accountsChanged failed: {e:?}")))?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn js_accounts(value: &wasm_bindgen::JsValue) -> Vec<Address> {
    if !js_sys::Array::is_array(value) {
        return Vec::new();
    }
    js_sys::Array::from(value)
        .iter()
        .filter_map(|item| item.as_string())
        .filter_map(|raw| raw.parse::<Address>().ok())
        .collect()
}

#[cfg(target_arch = "wasm32")]
fn browser_provider() -> Result<wasm_bindgen::JsValue, PortError> {
    let window =
        web_sys::window().ok_or_else(|| PortError::Transport("missing window".to_owned()))?;
    let provider = get_prop(&window.into(), "ethereum")?;
    if provider.is_null() || provider.is_undefined() {
        return Err(PortError::NotFound("window.ethereum missing".to_owned()));
    }
    Ok(provider)
}

#[cfg(target_arch = "wasm32")]
fn provider_fn(
    provider: &wasm_bindgen::JsValue,
    names: &[&str],
) -> Result<js_sys::Function, PortError> {
    use wasm_bindgen::JsCast;

    names
        .iter()
        .find_map(|name| {
            get_prop(provider, name)
                .ok()
                .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
        })
        .ok_or_else(|| PortError::NotFound(format!("window.ethereum.{} is unavailable", names[0])))
}

#[cfg(target_arch = "wasm32")]
fn get_prop(target: &wasm_bindgen::JsValue, key: &str) -> Result<wasm_bindgen::JsValue, PortError> {
    js_sys::Reflect::get(target, &wasm_bindgen::JsValue::from_str(key))
        .map_err(|e| PortError::Transport(format!("read provider property {key} failed: {e:?}")))
}
