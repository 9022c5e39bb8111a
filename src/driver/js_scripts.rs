//! JavaScript evaluated in the listing page
//!
//! `*_FN` constants are function declarations for `Element::call_js_fn`
//! (`this` is the element). The builder functions return expressions for
//! `Page::evaluate`, with caller data embedded as JSON literals.

/// Element occupies layout space and is not hidden by style
pub const IS_VISIBLE_FN: &str = r"
    function() {
        const rect = this.getBoundingClientRect();
        const style = window.getComputedStyle(this);
        return rect.width > 0
            && rect.height > 0
            && style.visibility !== 'hidden'
            && style.display !== 'none';
    }
";

/// Disabled by attribute, by class on the element or its parent, or by ARIA
pub const IS_DISABLED_FN: &str = r"
    function() {
        return this.classList.contains('disabled')
            || this.hasAttribute('disabled')
            || (this.parentElement !== null && this.parentElement.classList.contains('disabled'))
            || this.getAttribute('aria-disabled') === 'true';
    }
";

/// Dispatch a click without hit-testing or visibility checks
pub const SCRIPT_CLICK_FN: &str = r"
    function() {
        this.click();
        return true;
    }
";

/// Clear an input so typed text replaces rather than appends
pub const CLEAR_VALUE_FN: &str = r"
    function() {
        this.focus();
        if ('value' in this) {
            this.value = '';
            this.dispatchEvent(new Event('input', { bubbles: true }));
        }
        return true;
    }
";

/// Document readiness and resource count, polled to detect network quiescence
pub const NETWORK_STATE_SCRIPT: &str = r"
    (() => ({
        readyState: document.readyState,
        resources: performance.getEntriesByType('resource').length
    }))()
";

/// Scan every DOM node for one whose own text contains `phrase` and click the
/// innermost such node. Evaluates to `true` when something was clicked.
#[must_use]
pub fn text_scan_click_script(phrase: &str) -> String {
    let literal = serde_json::to_string(phrase).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r"
        (() => {{
            const phrase = {literal};
            const nodes = Array.from(document.querySelectorAll('*'));
            const hits = nodes.filter(el => (el.innerText || el.textContent || '').includes(phrase));
            if (hits.length === 0) {{
                return false;
            }}
            const innermost = hits.filter(el => !hits.some(other => other !== el && el.contains(other)));
            const target = innermost.length > 0 ? innermost[0] : hits[hits.length - 1];
            target.click();
            return true;
        }})()
        "
    )
}

/// Fetch `url` with the page's cookies and referrer and return the body as
/// base64, or an error description.
#[must_use]
pub fn fetch_base64_script(url: &str) -> String {
    let literal = serde_json::to_string(url).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r"
        (async () => {{
            try {{
                const res = await fetch({literal}, {{ credentials: 'include', cache: 'no-store' }});
                if (!res.ok) {{
                    return {{ ok: false, status: res.status, error: 'HTTP ' + res.status }};
                }}
                const bytes = new Uint8Array(await res.arrayBuffer());
                let binary = '';
                const chunk = 0x8000;
                for (let i = 0; i < bytes.length; i += chunk) {{
                    binary += String.fromCharCode.apply(null, bytes.subarray(i, i + chunk));
                }}
                return {{ ok: true, status: res.status, data: btoa(binary) }};
            }} catch (e) {{
                return {{ ok: false, status: 0, error: String((e && e.message) || e || 'fetch failed') }};
            }}
        }})()
        "
    )
}

/// Stealth patches installed before any page script runs
pub const STEALTH_SCRIPT: &str = r"
    Object.defineProperty(navigator, 'webdriver', { get: () => false });
    Object.defineProperty(navigator, 'languages', { get: () => ['zh-TW', 'zh', 'en-US', 'en'] });
    if (!window.chrome) {
        window.chrome = {};
    }
    if (!window.chrome.runtime) {
        window.chrome.runtime = {
            connect: () => ({
                onMessage: { addListener: () => {}, removeListener: () => {} },
                postMessage: () => {}
            })
        };
    }
    if (window.WebGLRenderingContext) {
        const getParameter = WebGLRenderingContext.prototype.getParameter;
        WebGLRenderingContext.prototype.getParameter = new Proxy(getParameter, {
            apply(target, ctx, args) {
                const param = (args && args[0]) || null;
                if (param === 37445) return 'Intel Inc.';
                if (param === 37446) return 'Intel Iris OpenGL Engine';
                return Reflect.apply(target, ctx, args);
            }
        });
    }
";
