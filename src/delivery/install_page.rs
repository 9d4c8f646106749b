use crate::delivery::bookmarklet::Bookmarklet;

// ============================================================================
// Install page: one self-contained HTML file
// ============================================================================

/// Render the install page for `bookmarklet`.
///
/// The page shows a draggable link, short instructions and a countdown. When
/// the countdown reaches zero the link is removed from the document, so an
/// expired bookmarklet cannot be dragged anymore.
pub fn render_install_page(bookmarklet: &Bookmarklet, title: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 0; padding: 0; background: #f5f5f5; }}
.header {{ background: #1976D2; color: white; padding: 20px 30px; }}
.header h1 {{ margin: 0 0 8px 0; font-size: 24px; }}
.header p {{ margin: 0; font-size: 14px; opacity: 0.9; }}
.content {{ max-width: 720px; margin: 20px auto; padding: 0 20px; }}
.card {{ background: white; border-radius: 6px; padding: 16px 20px; margin-bottom: 12px; }}
.bookmarklet {{ display: inline-block; padding: 10px 18px; background: #4CAF50; color: white; border-radius: 4px; text-decoration: none; font-weight: bold; cursor: grab; }}
.expired {{ color: #f44336; font-weight: bold; }}
ol li {{ margin-bottom: 6px; }}
</style>
</head>
<body>
<div class="header">
<h1>{title}</h1>
<p>Bookmarklet {id}, valid until {expires_text}</p>
</div>
<div class="content">
<div class="card" id="install">
<p><a class="bookmarklet" id="bookmarklet-link" href="{href}">{title}</a></p>
<ol>
<li>Drag the button above onto your bookmarks bar.</li>
<li>Open the form you want to fill.</li>
<li>Click the bookmark. Fields that already have a value are left alone.</li>
<li>Delete the bookmark when you are done.</li>
</ol>
</div>
<div class="card">
<p id="countdown">Expires in --:--</p>
</div>
</div>
<script>
(function () {{
  var expiresAt = {expires_ms};
  var countdown = document.getElementById('countdown');
  function expire() {{
    var link = document.getElementById('bookmarklet-link');
    if (link && link.parentNode) link.parentNode.removeChild(link);
    countdown.className = 'expired';
    countdown.textContent = 'This bookmarklet has expired. Generate a new one.';
  }}
  function tick() {{
    var left = expiresAt - Date.now();
    if (left <= 0) {{
      expire();
      return;
    }}
    var minutes = Math.floor(left / 60000);
    var seconds = Math.floor((left % 60000) / 1000);
    countdown.textContent = 'Expires in ' + minutes + ':' + (seconds < 10 ? '0' : '') + seconds;
    setTimeout(tick, 1000);
  }}
  tick();
}})();
</script>
</body>
</html>"##,
        title = escape_html(title),
        id = escape_html(&bookmarklet.id),
        expires_text = bookmarklet.expires_at.format("%Y-%m-%d %H:%M:%S UTC"),
        href = escape_html(&bookmarklet.href),
        expires_ms = bookmarklet.expires_at.timestamp_millis(),
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
