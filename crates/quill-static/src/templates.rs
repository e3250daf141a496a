//! Template engine for rendering blog pages.

use minijinja::{context, Environment};

use quill_mdx::Frontmatter;

/// Context for the post list page.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IndexContext {
    pub site_title: String,
    pub base_url: String,
    /// Listed posts, newest first
    pub posts: Vec<Frontmatter>,
}

/// Context for a single post page.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PostContext {
    pub site_title: String,
    pub base_url: String,
    pub post: Frontmatter,
    /// Rendered content HTML, table of contents included
    pub content: String,
    /// Newer neighbour
    pub prev: Option<Frontmatter>,
    /// Older neighbour
    pub next: Option<Frontmatter>,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the built-in templates.
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();

        env.add_template_owned("base.html".to_string(), BASE_TEMPLATE.to_string())?;
        env.add_template_owned("index.html".to_string(), INDEX_TEMPLATE.to_string())?;
        env.add_template_owned("post.html".to_string(), POST_TEMPLATE.to_string())?;
        env.add_template_owned("entry.html".to_string(), ENTRY_TEMPLATE.to_string())?;

        Ok(Self { env })
    }

    pub fn render_index(&self, context: &IndexContext) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("index.html")?;

        tmpl.render(context! {
            title => &context.site_title,
            site_title => &context.site_title,
            base_url => &context.base_url,
            posts => &context.posts,
        })
    }

    pub fn render_post(&self, context: &PostContext) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("post.html")?;

        tmpl.render(context! {
            title => &context.post.title,
            site_title => &context.site_title,
            base_url => &context.base_url,
            post => &context.post,
            content => &context.content,
            prev => &context.prev,
            next => &context.next,
        })
    }
}

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en" data-theme="dark">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{% if title != site_title %}{{ title }} - {% endif %}{{ site_title }}</title>
  <link rel="stylesheet" href="{{ base_url }}assets/main.css">
</head>
<body>
  <header class="site-header">
    <a href="{{ base_url }}" class="site-title">{{ site_title }}</a>
    <button type="button" class="theme-toggle" aria-label="Toggle theme">Theme</button>
  </header>
  <main class="main">
    {% block content %}{% endblock %}
  </main>
  <script src="{{ base_url }}assets/main.js"></script>
</body>
</html>"##;

const ENTRY_TEMPLATE: &str = r##"<a href="{{ base_url }}posts/{{ entry.slug }}/" class="post-link">
  <span class="post-link-title">{{ entry.title }}</span>
  <span class="post-meta"><time datetime="{{ entry.date }}">{{ entry.date }}</time>{% if entry.readingTime %} · {{ entry.readingTime }}read{% endif %}</span>
</a>"##;

const INDEX_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<section class="post-list">
{% if posts %}
  <ul>
  {% for entry in posts %}
    <li>
      {% include "entry.html" %}
      {% if entry.description %}<p class="post-description">{{ entry.description }}</p>{% endif %}
    </li>
  {% endfor %}
  </ul>
{% else %}
  <p class="empty">No posts yet.</p>
{% endif %}
</section>
{% endblock %}"##;

const POST_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<article class="post">
  <header class="post-header">
    <h1>{{ post.title }}</h1>
    <p class="post-meta"><time datetime="{{ post.date }}">{{ post.date }}</time>{% if post.readingTime %} · {{ post.readingTime }}read{% endif %}</p>
    {% if post.tags %}<ul class="post-tags">{% for tag in post.tags %}<li>{{ tag }}</li>{% endfor %}</ul>{% endif %}
  </header>
  <div class="content">
    {{ content | safe }}
  </div>
</article>

{% if prev or next %}
<nav class="post-nav">
  {% if prev %}{% with entry = prev %}<div class="post-nav-prev">Newer {% include "entry.html" %}</div>{% endwith %}{% endif %}
  {% if next %}{% with entry = next %}<div class="post-nav-next">Older {% include "entry.html" %}</div>{% endwith %}{% endif %}
</nav>
{% endif %}
{% endblock %}"##;

#[cfg(test)]
mod tests {
    use super::*;

    fn frontmatter(slug: &str, title: &str, date: &str) -> Frontmatter {
        let yaml = format!(
            "title: {title}\ndate: {date}\nslug: {slug}\nreadingTime: '3 min '\ntags: [rust]\n"
        );
        serde_yaml::from_str(&yaml).unwrap()
    }

    /// Autoescaping encodes `/` in interpolated values.
    fn unescape_slashes(html: String) -> String {
        html.replace("&#x2f;", "/")
    }

    #[test]
    fn renders_post_list() {
        let engine = TemplateEngine::new().unwrap();

        let html = engine
            .render_index(&IndexContext {
                site_title: "Blog".to_string(),
                base_url: "/".to_string(),
                posts: vec![frontmatter("hello", "Hello", "2024-01-01")],
            })
            .map(unescape_slashes)
            .unwrap();

        assert!(html.contains("<title>Blog</title>"));
        assert!(html.contains(r#"<a href="/posts/hello/" class="post-link">"#));
        assert!(html.contains("3 min read"));
    }

    #[test]
    fn renders_empty_list() {
        let engine = TemplateEngine::new().unwrap();

        let html = engine
            .render_index(&IndexContext {
                site_title: "Blog".to_string(),
                base_url: "/".to_string(),
                posts: vec![],
            })
            .unwrap();

        assert!(html.contains("No posts yet."));
    }

    #[test]
    fn renders_post_with_navigation() {
        let engine = TemplateEngine::new().unwrap();

        let html = engine
            .render_post(&PostContext {
                site_title: "Blog".to_string(),
                base_url: "/".to_string(),
                post: frontmatter("mid", "Middle", "2024-02-01"),
                content: "<p>Hello world</p>".to_string(),
                prev: Some(frontmatter("new", "Newer Post", "2024-03-01")),
                next: None,
            })
            .map(unescape_slashes)
            .unwrap();

        assert!(html.contains("<title>Middle - Blog</title>"));
        assert!(html.contains("<p>Hello world</p>"));
        assert!(html.contains(r#"href="/posts/new/""#));
        assert!(!html.contains("post-nav-next"));
    }

    #[test]
    fn omits_navigation_without_neighbours() {
        let engine = TemplateEngine::new().unwrap();

        let html = engine
            .render_post(&PostContext {
                site_title: "Blog".to_string(),
                base_url: "/".to_string(),
                post: frontmatter("draft", "Draft", "2024-02-01"),
                content: String::new(),
                prev: None,
                next: None,
            })
            .unwrap();

        assert!(!html.contains("post-nav"));
    }
}
