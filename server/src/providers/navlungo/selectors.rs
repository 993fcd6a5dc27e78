pub struct NavlungoSelectors;

impl NavlungoSelectors {
    pub const EMAIL_INPUTS: &'static [&'static str] = &[
        "input[type='email']",
        "input[name='email']",
        "input[name='username']",
        "#email",
    ];

    pub const PASSWORD_INPUTS: &'static [&'static str] = &[
        "input[type='password']",
        "input[name='password']",
        "#password",
    ];

    /// localStorage keys written by the Firebase auth SDK.
    pub const AUTH_USER_KEY_PREFIX: &'static str = "firebase:authUser:";

    pub const AUTH_DB_NAME: &'static str = "firebaseLocalStorageDb";
    pub const AUTH_DB_STORE: &'static str = "firebaseLocalStorage";

    /// A response is inspected when its URL contains any of these.
    pub const QUOTE_URL_KEYWORDS: &'static [&'static str] = &["quote", "price", "rate", "calculate"];
}

/// JS string literal for `value`.
fn js_str(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// True once the page has left the login path or the auth SDK has stored a user.
pub fn login_detected_script(login_path: &str) -> String {
    format!(
        r#"(() => {{
            if (!window.location.href.includes({path})) return true;
            return Object.keys(window.localStorage).some(k => k.startsWith({prefix}));
        }})()"#,
        path = js_str(login_path),
        prefix = js_str(NavlungoSelectors::AUTH_USER_KEY_PREFIX),
    )
}

/// First auth-user record in localStorage, parsed, or null.
pub fn local_storage_token_script() -> String {
    format!(
        r#"(() => {{
            for (let i = 0; i < window.localStorage.length; i++) {{
                const key = window.localStorage.key(i);
                if (key && key.startsWith({prefix})) {{
                    try {{ return JSON.parse(window.localStorage.getItem(key)); }} catch (e) {{ return null; }}
                }}
            }}
            return null;
        }})()"#,
        prefix = js_str(NavlungoSelectors::AUTH_USER_KEY_PREFIX),
    )
}

/// Auth-user entry from the SDK's IndexedDB store, or null. Resolves a promise.
pub fn indexed_db_token_script() -> String {
    format!(
        r#"new Promise((resolve) => {{
            let request;
            try {{ request = window.indexedDB.open({db}); }} catch (e) {{ resolve(null); return; }}
            request.onerror = () => resolve(null);
            request.onsuccess = () => {{
                const db = request.result;
                if (!db.objectStoreNames.contains({store})) {{ db.close(); resolve(null); return; }}
                const all = db.transaction({store}, 'readonly').objectStore({store}).getAll();
                all.onerror = () => {{ db.close(); resolve(null); }};
                all.onsuccess = () => {{
                    db.close();
                    const entry = (all.result || []).find(r => r && typeof r.fbase_key === 'string'
                        && r.fbase_key.startsWith({prefix}));
                    resolve(entry || null);
                }};
            }};
        }})"#,
        db = js_str(NavlungoSelectors::AUTH_DB_NAME),
        store = js_str(NavlungoSelectors::AUTH_DB_STORE),
        prefix = js_str(NavlungoSelectors::AUTH_USER_KEY_PREFIX),
    )
}
