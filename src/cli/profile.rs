use anyhow::Result;

use crate::app::MedCare;
use crate::store::profiles::UserProfile;

/// Show the profile, or update it when a name or phone is given.
pub async fn profile(app: &MedCare, user: &str, name: Option<String>, phone: Option<String>) -> Result<()> {
    let existing = app.profile(user).await?;

    if name.is_some() || phone.is_some() {
        let current = existing.unwrap_or_else(|| UserProfile {
            user_id: user.to_string(),
            display_name: String::new(),
            phone_number: String::new(),
        });
        let updated = UserProfile {
            display_name: name.unwrap_or(current.display_name),
            phone_number: phone.unwrap_or(current.phone_number),
            user_id: current.user_id,
        };
        app.set_profile(updated.clone()).await?;
        println!("Profile updated.");
        print_profile(&updated);
        return Ok(());
    }

    match existing {
        Some(profile) => print_profile(&profile),
        None => println!("No profile for {user}. Set one with --name and --phone."),
    }
    Ok(())
}

fn print_profile(profile: &UserProfile) {
    println!("User:   {}", profile.user_id);
    println!("Name:   {}", profile.display_name);
    println!("Phone:  {}", profile.phone_number);
}
