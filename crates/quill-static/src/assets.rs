//! Asset pipeline for CSS and JavaScript processing.

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Generate the main CSS file.
    pub fn generate_css() -> String {
        DEFAULT_CSS.to_string()
    }

    /// Generate the main JavaScript file.
    pub fn generate_js() -> String {
        DEFAULT_JS.to_string()
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }
}

// Code blocks are rendered once per theme; the page theme decides which
// wrapper is visible.
const DEFAULT_CSS: &str = r#"/* quill blog theme */

:root {
  --content-max-width: 720px;
  --radius: 0.5rem;
}

html[data-theme="dark"] {
  --background: #0b0b0b;
  --foreground: #dbd7ca;
  --muted: #8a8a8a;
  --border: #262626;
  --accent: #4d9375;
}

html[data-theme="light"] {
  --background: #ffffff;
  --foreground: #393a34;
  --muted: #6b6b6b;
  --border: #e5e5e5;
  --accent: #1e754f;
}

* {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: var(--font-sans, system-ui, -apple-system, sans-serif);
  background: var(--background);
  color: var(--foreground);
  line-height: 1.7;
}

a {
  color: var(--accent);
}

.site-header {
  display: flex;
  justify-content: space-between;
  align-items: center;
  max-width: var(--content-max-width);
  margin: 0 auto;
  padding: 1.5rem 1rem;
}

.site-title {
  font-weight: 700;
  color: var(--foreground);
  text-decoration: none;
}

.theme-toggle {
  background: none;
  border: 1px solid var(--border);
  border-radius: var(--radius);
  color: var(--muted);
  padding: 0.25rem 0.75rem;
  cursor: pointer;
}

.main {
  max-width: var(--content-max-width);
  margin: 0 auto;
  padding: 0 1rem 4rem;
}

/* Post list */
.post-list ul {
  list-style: none;
  padding: 0;
}

.post-list li {
  margin-bottom: 1.5rem;
}

.post-link {
  display: flex;
  flex-direction: column;
  text-decoration: none;
}

.post-link-title {
  font-size: 1.125rem;
  color: var(--foreground);
}

.post-meta,
.post-description {
  color: var(--muted);
  font-size: 0.875rem;
  margin: 0;
}

.post-tags {
  display: flex;
  gap: 0.5rem;
  list-style: none;
  padding: 0;
  font-size: 0.75rem;
  color: var(--muted);
}

/* Table of contents */
.toc {
  border-left: 2px solid var(--border);
  padding-left: 1rem;
  margin-bottom: 2rem;
  font-size: 0.875rem;
}

.toc ol {
  list-style: none;
  padding-left: 1rem;
  margin: 0;
}

.toc > ol {
  padding-left: 0;
}

.toc-link {
  color: var(--muted);
  text-decoration: none;
}

/* Headings */
.content .anchor {
  color: inherit;
  text-decoration: none;
}

.content .anchor:hover::after {
  content: " #";
  color: var(--muted);
}

/* Code blocks */
figure[data-rehype-pretty-code-figure] {
  margin: 1.5rem 0;
}

html[data-theme="dark"] .code-block-light,
html[data-theme="light"] .code-block-dark {
  display: none;
}

.code-block {
  border: 1px solid var(--border);
  border-radius: var(--radius);
  overflow: hidden;
}

.code-block-header {
  display: flex;
  justify-content: space-between;
  align-items: center;
  padding: 0.25rem 0.75rem;
  border-bottom: 1px solid var(--border);
  font-size: 0.75rem;
  color: var(--muted);
}

.copy-button {
  background: none;
  border: none;
  color: inherit;
  cursor: pointer;
}

.code-block pre {
  margin: 0;
  padding: 1rem 0;
  overflow-x: auto;
}

.code-block [data-line] {
  padding: 0 1rem;
}

/* Math */
.math-display {
  overflow-x: auto;
  margin: 1rem 0;
}

.math-error {
  color: #f85149;
  font-family: var(--font-mono, monospace);
  white-space: pre-wrap;
}

/* Admonitions */
.admonition {
  border: 1px solid var(--border);
  border-left-width: 4px;
  border-radius: var(--radius);
  padding: 0.75rem 1rem;
  margin: 1.5rem 0;
}

.admonition-heading {
  display: flex;
  align-items: center;
  gap: 0.5rem;
  font-weight: 600;
}

.admonition-title {
  margin: 0;
}

.admonition-note,
.admonition-info {
  border-left-color: #4493f8;
}

.admonition-tip {
  border-left-color: #3fb950;
}

.admonition-warning,
.admonition-caution {
  border-left-color: #d29922;
}

.admonition-danger {
  border-left-color: #f85149;
}

/* Post navigation */
.post-nav {
  display: flex;
  justify-content: space-between;
  gap: 1rem;
  margin-top: 3rem;
  padding-top: 1.5rem;
  border-top: 1px solid var(--border);
}

.post-nav-next {
  margin-left: auto;
  text-align: right;
}

/* Footnotes */
.footnotes {
  margin-top: 3rem;
  font-size: 0.875rem;
  color: var(--muted);
}
"#;

const DEFAULT_JS: &str = r#"// quill blog runtime
(function() {
  'use strict';

  const root = document.documentElement;
  const stored = localStorage.getItem('theme');
  if (stored === 'dark' || stored === 'light') {
    root.dataset.theme = stored;
  } else if (window.matchMedia('(prefers-color-scheme: light)').matches) {
    root.dataset.theme = 'light';
  }

  const toggle = document.querySelector('.theme-toggle');
  if (toggle) {
    toggle.addEventListener('click', () => {
      const next = root.dataset.theme === 'dark' ? 'light' : 'dark';
      root.dataset.theme = next;
      localStorage.setItem('theme', next);
    });
  }

  // Copy buttons carry the code's plain text
  document.querySelectorAll('.copy-button').forEach(btn => {
    btn.addEventListener('click', async () => {
      try {
        await navigator.clipboard.writeText(btn.dataset.copy || '');
        btn.textContent = 'Copied!';
      } catch (err) {
        btn.textContent = 'Error';
      }
      setTimeout(() => { btn.textContent = 'Copy'; }, 2000);
    });
  });
})();
"#;
