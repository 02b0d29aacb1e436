use crate::output::escape_html;

const IDENTITY_SLOT: &str = "{{current_identity}}";

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>IAM Policy Validator</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 20px; }
        .container { max-width: 1200px; margin: 0 auto; }
        .section { margin: 20px 0; padding: 20px; border: 1px solid #ddd; border-radius: 5px; }
        textarea { width: 100%; height: 300px; font-family: monospace; }
        button { padding: 10px 20px; margin: 5px; cursor: pointer; }
        .finding { margin: 10px 0; padding: 10px; border-radius: 5px; }
        .error { background-color: #ffebee; border-left: 4px solid #f44336; }
        .warning { background-color: #fff3e0; border-left: 4px solid #ff9800; }
        .info { background-color: #e3f2fd; border-left: 4px solid #2196f3; }
        .success { background-color: #e8f5e8; border-left: 4px solid #4caf50; }
        .hidden { display: none; }
    </style>
</head>
<body>
<div class="container">
    <h1>IAM Policy Validator</h1>

    <div class="section">
        <h3>AWS Configuration</h3>
        <p><strong>Current Identity:</strong> <span id="current-identity" data-testid="current-identity">{{current_identity}}</span></p>
        <button onclick="changeProfile()" data-testid="profile-selector">Change Profile</button>
    </div>

    <div class="section">
        <h3>Policy Input</h3>
        <div>
            <label><input type="radio" name="policy-type" value="IDENTITY_POLICY" checked data-testid="policy-type-identity"> Identity Policy</label>
            <label><input type="radio" name="policy-type" value="RESOURCE_POLICY" data-testid="policy-type-resource"> Resource Policy</label>
        </div>
        <textarea id="policy-input" data-testid="policy-input" placeholder="Paste your IAM policy JSON here..."></textarea>
        <div>
            <button id="validate-button" onclick="validatePolicy()" data-testid="validate-button">Validate Policy</button>
            <button onclick="document.getElementById('file-input').click()" data-testid="load-file-button">Load from File</button>
            <button onclick="showExamples()" data-testid="help-menu">Examples</button>
        </div>
        <input type="file" id="file-input" data-testid="file-input" accept=".json" style="display: none;" onchange="handleFileLoad(event)">
    </div>

    <div class="section">
        <h3>Validation Results</h3>
        <div id="validation-results" data-testid="validation-results"></div>
    </div>

    <div id="examples-modal" class="hidden">
        <div class="section">
            <h3>Example Policies</h3>
            <button onclick="loadExample('overpermissive')" data-testid="load-example-overpermissive">Overly Permissive Policy</button>
            <button onclick="loadExample('well_scoped_s3')">Well-Scoped S3 Policy</button>
            <button onclick="loadExample('resource_policy')">Resource Policy</button>
            <button onclick="hideExamples()">Close</button>
        </div>
    </div>
</div>

<script>
    let examples = {};

    function showError(message) {
        const div = document.createElement('div');
        div.className = 'error';
        div.textContent = '❌ ' + message;
        const results = document.getElementById('validation-results');
        results.replaceChildren(div);
    }

    async function changeProfile() {
        const profile = prompt("Enter AWS profile name (or leave empty for default):");
        if (profile === null) return;
        try {
            const response = await fetch('/api/set-profile', {
                method: 'POST',
                headers: {'Content-Type': 'application/json'},
                body: JSON.stringify({profile: profile || null})
            });
            const data = await response.json();
            if (data.success) {
                document.getElementById('current-identity').textContent = data.identity;
            } else {
                alert('Error: ' + data.error);
            }
        } catch (error) {
            alert('Error changing profile: ' + error.message);
        }
    }

    async function validatePolicy() {
        const policyText = document.getElementById('policy-input').value;
        const policyType = document.querySelector('input[name="policy-type"]:checked').value;
        const button = document.getElementById('validate-button');
        const results = document.getElementById('validation-results');

        if (!policyText.trim()) {
            showError('Please enter a policy document');
            return;
        }

        button.disabled = true;
        results.textContent = 'Validating policy...';
        try {
            const response = await fetch('/api/validate', {
                method: 'POST',
                headers: {'Content-Type': 'application/json'},
                body: JSON.stringify({policy: policyText, type: policyType})
            });
            const data = await response.json();
            if (data.error) {
                showError(data.error);
            } else {
                results.innerHTML = data.html;
            }
        } catch (error) {
            showError('Error: ' + error.message);
        } finally {
            button.disabled = false;
        }
    }

    function handleFileLoad(event) {
        const file = event.target.files[0];
        if (!file) return;
        const reader = new FileReader();
        reader.onload = e => { document.getElementById('policy-input').value = e.target.result; };
        reader.readAsText(file);
    }

    async function showExamples() {
        if (Object.keys(examples).length === 0) {
            const response = await fetch('/api/examples');
            examples = await response.json();
        }
        document.getElementById('examples-modal').classList.remove('hidden');
    }

    function hideExamples() {
        document.getElementById('examples-modal').classList.add('hidden');
    }

    function loadExample(name) {
        if (examples[name]) {
            document.getElementById('policy-input').value = JSON.stringify(examples[name], null, 2);
            hideExamples();
        }
    }
</script>
</body>
</html>
"#;

/// The page with the identity label filled in (escaped).
pub fn render_index(identity: &str) -> String {
    INDEX_HTML.replace(IDENTITY_SLOT, &escape_html(identity))
}
