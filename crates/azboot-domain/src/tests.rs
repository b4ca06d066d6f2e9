use crate::types::*;

fn repo() -> GitHubRepo {
    GitHubRepo::parse("o/r").unwrap()
}

#[test]
fn branch_subject() {
    assert_eq!(
        SubjectMode::Branch.subject(&repo(), "main").unwrap(),
        "repo:o/r:ref:refs/heads/main"
    );
}

#[test]
fn environment_subject() {
    assert_eq!(
        SubjectMode::Environment.subject(&repo(), "prod").unwrap(),
        "repo:o/r:environment:prod"
    );
}

#[test]
fn tags_subject() {
    assert_eq!(
        SubjectMode::Tags.subject(&repo(), "v1").unwrap(),
        "repo:o/r:ref:refs/tags/v1"
    );
}

#[test]
fn empty_subject_value_rejected() {
    assert!(SubjectMode::Branch.subject(&repo(), "").is_err());
    assert!(SubjectMode::Branch.subject(&repo(), " main").is_err());
}

#[test]
fn repository_parsing() {
    let r = GitHubRepo::parse("octo/app").unwrap();
    assert_eq!(r.owner(), "octo");
    assert_eq!(r.name(), "app");
    assert_eq!(r.to_string(), "octo/app");

    for bad in ["octo", "/app", "octo/", "a/b/c", "oc to/app"] {
        assert!(GitHubRepo::parse(bad).is_err(), "accepted {:?}", bad);
    }
}

#[test]
fn subject_mode_round_trips_through_str() {
    for mode in [SubjectMode::Branch, SubjectMode::Environment, SubjectMode::Tags] {
        assert_eq!(mode.to_string().parse::<SubjectMode>().unwrap(), mode);
    }
    assert!("release".parse::<SubjectMode>().is_err());
}

#[test]
fn github_credential_uses_fixed_issuer_and_audience() {
    let fc = FederatedCredential::github(&repo(), SubjectMode::Branch, "main").unwrap();
    assert_eq!(fc.issuer, GITHUB_OIDC_ISSUER);
    assert_eq!(fc.audiences, vec![AZURE_AD_AUDIENCE.to_string()]);
    assert!(fc.is_github_actions());
    assert!(fc.name.starts_with("gh-o-r-branch-main-"), "got: {}", fc.name);
}

#[test]
fn credential_matching_requires_all_three_fields() {
    let base = FederatedCredential::github(&repo(), SubjectMode::Branch, "main").unwrap();

    let mut renamed = base.clone();
    renamed.name = "something-else".into();
    renamed.description = None;
    assert!(base.matches(&renamed), "name and description are not part of the key");

    let mut other_audience = base.clone();
    other_audience.audiences = vec!["api://other".into()];
    assert!(!base.matches(&other_audience));

    let mut other_subject = base.clone();
    other_subject.subject = "repo:o/r:ref:refs/heads/dev".into();
    assert!(!base.matches(&other_subject));

    let mut other_issuer = base.clone();
    other_issuer.issuer = "https://example.com".into();
    assert!(!base.matches(&other_issuer));
}

#[test]
fn audience_set_ignores_order_and_duplicates() {
    let mut a = FederatedCredential::github(&repo(), SubjectMode::Tags, "v1").unwrap();
    let mut b = a.clone();
    a.audiences = vec!["x".into(), "y".into()];
    b.audiences = vec!["y".into(), "x".into(), "y".into()];
    assert!(a.matches(&b));
}

#[test]
fn scopes() {
    assert_eq!(subscription_scope("sub"), "/subscriptions/sub");
    assert_eq!(
        ScopeLevel::ResourceGroup.scope("sub", "rg"),
        "/subscriptions/sub/resourceGroups/rg"
    );
    assert_eq!(ScopeLevel::Subscription.scope("sub", "rg"), "/subscriptions/sub");
}

#[test]
fn role_binding_comparison_is_case_insensitive() {
    let a = RoleAssignment {
        assignee: "ABC".into(),
        role: "Contributor".into(),
        scope: "/subscriptions/S/resourceGroups/RG".into(),
    };
    let b = RoleAssignment {
        assignee: "abc".into(),
        role: "contributor".into(),
        scope: "/subscriptions/s/resourcegroups/rg/".into(),
    };
    assert!(a.same_binding(&b));
}

#[test]
fn subscription_comparison_ignores_case() {
    let ctx = CallerContext {
        tenant_id: "t".into(),
        subscription_id: "AAAA-bbbb".into(),
        subscription_name: "dev".into(),
        user_name: "me".into(),
    };
    assert!(ctx.is_subscription("aaaa-BBBB"));
    assert!(!ctx.is_subscription("cccc"));
}
